//! roster-server binary.
//!
//! Reads `roster.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the REST API and SMS relay over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_relay::TwilioProvider;
use roster_server::{ServerConfig, expand_tilde};
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Roster fee and attendance server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "roster.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let provider = match server_cfg.sms.clone() {
    Some(sms) if sms.is_complete() => {
      let provider = TwilioProvider::new(sms).context("failed to build SMS client")?;
      Some(Arc::new(provider))
    }
    Some(_) => {
      tracing::warn!("SMS credentials incomplete; relay disabled");
      None
    }
    None => {
      tracing::info!("SMS not configured; relay disabled");
      None
    }
  };

  let app = roster_server::app(Arc::new(store), server_cfg.institute.clone(), provider);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
