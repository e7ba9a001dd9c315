//! `roster`: command-line client for the Roster server.
//!
//! # Usage
//!
//! ```
//! roster --url http://localhost:3000 students list
//! roster pay <STUDENT_ID> --through 2024-03 --amount 1350
//! roster --config ~/.config/roster/cli.toml report 2024-03
//! ```

mod client;
mod output;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use roster_core::{attendance::AttendanceStatus, month::YearMonth};
use serde::Deserialize;
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Students, attendance and fees for a training institute")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the roster server (default: http://localhost:3000).
  #[arg(long, env = "ROSTER_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage students.
  #[command(subcommand)]
  Students(StudentsCmd),

  /// Show what a student owes through a month.
  Dues {
    student_id: String,
    /// Last month to consider, as YYYY-MM.
    #[arg(long)]
    through:    YearMonth,
    /// Preview which months this amount would settle.
    #[arg(long)]
    amount:     Option<u64>,
  },

  /// Record a fee payment covering the earliest unpaid months.
  Pay {
    student_id: String,
    #[arg(long)]
    through:    YearMonth,
    #[arg(long)]
    amount:     u64,
    /// Defaults to today.
    #[arg(long)]
    date:       Option<NaiveDate>,
    #[arg(long, default_value = "Cash")]
    mode:       String,
    #[arg(long, default_value = "")]
    notes:      String,
    /// Replace existing entries for the covered months.
    #[arg(long)]
    overwrite:  bool,
  },

  /// Daily attendance.
  #[command(subcommand)]
  Attendance(AttendanceCmd),

  /// Payment receipts.
  #[command(subcommand)]
  Receipts(ReceiptsCmd),

  /// Collections and dues for a month (YYYY-MM).
  Report { month: YearMonth },

  /// Export or restore the whole record.
  #[command(subcommand)]
  Backup(BackupCmd),

  /// Erase every student, payment and attendance entry.
  Reset {
    #[arg(long)]
    yes: bool,
  },

  /// Send a text message through the server's SMS relay.
  Sms {
    #[arg(long)]
    to:   String,
    #[arg(long)]
    body: String,
  },
}

#[derive(Subcommand, Debug)]
enum StudentsCmd {
  List {
    /// Match against name, mobile, class, timing and machine.
    #[arg(short, long)]
    query: Option<String>,
    /// Junior or Senior.
    #[arg(long)]
    class: Option<String>,
    /// Include students marked inactive.
    #[arg(long)]
    all:   bool,
  },
  Add {
    #[arg(long)]
    name:    String,
    /// Junior or Senior.
    #[arg(long)]
    class:   String,
    /// One of the fixed timing slots, e.g. "6.30 am - 7.30 am".
    #[arg(long)]
    timing:  String,
    #[arg(long)]
    machine: Option<u8>,
    #[arg(long)]
    mobile:  Option<String>,
    /// Date of joining, YYYY-MM-DD.
    #[arg(long)]
    joined:  NaiveDate,
    /// Monthly fee in rupees.
    #[arg(long)]
    fee:     Option<u64>,
  },
  /// Delete a student with all of their payments and attendance.
  Remove { id: String },
}

#[derive(Subcommand, Debug)]
enum AttendanceCmd {
  Show { date: NaiveDate },
  /// Replace the date's attendance with `ID=P` / `ID=A` marks.
  Set {
    date:  NaiveDate,
    #[arg(required = true, value_parser = parse_mark)]
    marks: Vec<(String, AttendanceStatus)>,
  },
}

#[derive(Subcommand, Debug)]
enum ReceiptsCmd {
  List {
    #[arg(short, long)]
    query: Option<String>,
  },
  /// Print the receipt for a payment id.
  Show { id: String },
  /// Print the WhatsApp share link for a payment id.
  Share { id: String },
}

#[derive(Subcommand, Debug)]
enum BackupCmd {
  /// Write the record to a file, or stdout.
  Export {
    #[arg(short, long)]
    out: Option<PathBuf>,
  },
  /// Replace the record with a backup file.
  Import {
    file:     PathBuf,
    /// Only import if the server's record still has this ETag.
    #[arg(long)]
    if_match: Option<String>,
  },
}

fn parse_mark(raw: &str) -> Result<(String, AttendanceStatus), String> {
  let (id, status) = raw
    .split_once('=')
    .ok_or_else(|| format!("expected ID=P or ID=A, got {raw:?}"))?;
  let status = status
    .parse::<AttendanceStatus>()
    .map_err(|_| format!("unknown status {status:?}; use P or A"))?;
  Ok((id.to_owned(), status))
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

/// Flag, then file, then the default.
fn resolve_url(flag: Option<String>, file: &ConfigFile) -> String {
  flag
    .or_else(|| (!file.url.is_empty()).then(|| file.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_owned())
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let base_url = resolve_url(args.url, &file_cfg);
  tracing::debug!(%base_url, "using server");
  let client = ApiClient::new(ApiConfig { base_url })?;

  run(&client, args.command).await
}

/// Student id → name, for labelling rows.
async fn student_names(client: &ApiClient) -> Result<BTreeMap<String, String>> {
  Ok(
    client
      .list_students(None, None, true)
      .await?
      .into_iter()
      .map(|s| (s.id, s.name))
      .collect(),
  )
}

async fn run(client: &ApiClient, command: Command) -> Result<()> {
  match command {
    Command::Students(StudentsCmd::List { query, class, all }) => {
      let list = client
        .list_students(query.as_deref(), class.as_deref(), all)
        .await?;
      print!("{}", output::students(&list));
    }
    Command::Students(StudentsCmd::Add { name, class, timing, machine, mobile, joined, fee }) => {
      let student = client
        .create_student(&json!({
          "name": name,
          "className": class,
          "timing": timing,
          "machineNo": machine,
          "mobile": mobile,
          "dateOfJoining": joined,
          "monthlyFee": fee,
        }))
        .await?;
      println!("Added {} ({})", student.name, student.id);
    }
    Command::Students(StudentsCmd::Remove { id }) => {
      client.delete_student(&id).await?;
      println!("Removed {id}");
    }

    Command::Dues { student_id, through, amount } => {
      let dues = client.dues(&student_id, through, amount).await?;
      print!("{}", output::dues(&dues));
    }

    Command::Pay { student_id, through, amount, date, mode, notes, overwrite } => {
      let paid_date = date.unwrap_or_else(|| Local::now().date_naive());
      let payment = client
        .record_payment(&json!({
          "studentId": student_id,
          "throughMonth": through,
          "amount": amount,
          "paidDate": paid_date,
          "mode": mode,
          "notes": notes,
          "allowOverwrite": overwrite,
        }))
        .await?;
      let months: Vec<String> = payment
        .months_covered
        .clone()
        .unwrap_or_else(|| vec![payment.month])
        .iter()
        .map(|m| m.label())
        .collect();
      println!("Receipt {} ({})", payment.receipt_no, payment.id);
      println!("Covers: {}", months.join(", "));
    }

    Command::Attendance(AttendanceCmd::Show { date }) => {
      let day = client.attendance(date).await?;
      let names = student_names(client).await?;
      print!("{}", output::attendance(&day, &names));
    }
    Command::Attendance(AttendanceCmd::Set { date, marks }) => {
      let statuses: BTreeMap<_, _> = marks.into_iter().collect();
      client.set_attendance(date, &statuses).await?;
      println!("Saved {} mark(s) for {date}", statuses.len());
    }

    Command::Receipts(ReceiptsCmd::List { query }) => {
      let list = client.list_payments(query.as_deref()).await?;
      let names = student_names(client).await?;
      print!("{}", output::payments(&list, &names));
    }
    Command::Receipts(ReceiptsCmd::Show { id }) => {
      print!("{}", client.receipt_text(&id).await?);
    }
    Command::Receipts(ReceiptsCmd::Share { id }) => {
      println!("{}", client.share_link(&id).await?.url);
    }

    Command::Report { month } => {
      print!("{}", output::summary(&client.month_summary(month).await?));
    }

    Command::Backup(BackupCmd::Export { out }) => {
      let backup = client.export_backup().await?;
      match out {
        Some(path) => {
          std::fs::write(&path, &backup.json)
            .with_context(|| format!("writing {}", path.display()))?;
          if let Some(etag) = backup.etag {
            eprintln!("ETag: {etag}");
          }
        }
        None => println!("{}", backup.json),
      }
    }
    Command::Backup(BackupCmd::Import { file, if_match }) => {
      let json = std::fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
      client.import_backup(json, if_match.as_deref()).await?;
      println!("Imported {}", file.display());
    }

    Command::Reset { yes } => {
      if !yes {
        bail!("reset erases all data; pass --yes to confirm");
      }
      client.reset().await?;
      println!("Record reset");
    }

    Command::Sms { to, body } => {
      let sid = client.send_sms(&to, &body).await?;
      println!("Sent ({sid})");
    }
  }
  Ok(())
}
