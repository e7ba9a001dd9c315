//! Async HTTP client wrapping the Roster JSON API.

use std::{collections::BTreeMap, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::{Client, Response, header};
use roster_core::{
  attendance::AttendanceStatus,
  month::YearMonth,
  payment::Payment,
  report::MonthSummary,
  student::Student,
};
use serde::Deserialize;
use serde_json::Value;

/// Connection settings for the Roster API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// `GET /students/{id}/dues` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dues {
  pub student_id:     String,
  pub through:        YearMonth,
  pub fee_per_month:  u64,
  pub unpaid_months:  Vec<YearMonth>,
  pub due_amount:     u64,
  #[serde(default)]
  pub covered_months: Option<Vec<YearMonth>>,
  #[serde(default)]
  pub hint:           Option<String>,
}

/// `GET /receipts/{id}/share` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareLink {
  pub url:  String,
  pub body: String,
}

/// A backup document together with its revision tag.
#[derive(Debug, Clone)]
pub struct Backup {
  pub json: String,
  pub etag: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Deserialize)]
struct SmsSent {
  sid: String,
}

/// Turn a non-success response into an error carrying the server's message.
async fn failure(resp: Response, what: &str) -> anyhow::Error {
  let status = resp.status();
  match resp.json::<ErrorBody>().await {
    Ok(body) => anyhow!("{what} → {status}: {}", body.error),
    Err(_) => anyhow!("{what} → {status}"),
  }
}

/// Async HTTP client for the Roster JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  // ── Students ──────────────────────────────────────────────────────────────

  /// `GET /api/students`
  pub async fn list_students(
    &self,
    query: Option<&str>,
    class: Option<&str>,
    include_inactive: bool,
  ) -> Result<Vec<Student>> {
    let mut params = vec![("include_inactive", include_inactive.to_string())];
    if let Some(q) = query {
      params.push(("query", q.to_owned()));
    }
    if let Some(c) = class {
      params.push(("class", c.to_owned()));
    }
    let resp = self
      .client
      .get(self.url("/students"))
      .query(&params)
      .send()
      .await
      .context("GET /students failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /students").await);
    }
    resp.json().await.context("deserialising students")
  }

  /// `POST /api/students` with a `NewStudent` body.
  pub async fn create_student(&self, body: &Value) -> Result<Student> {
    let resp = self
      .client
      .post(self.url("/students"))
      .json(body)
      .send()
      .await
      .context("POST /students failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "POST /students").await);
    }
    resp.json().await.context("deserialising student")
  }

  /// `DELETE /api/students/{id}`
  pub async fn delete_student(&self, id: &str) -> Result<()> {
    let resp = self
      .client
      .delete(self.url(&format!("/students/{id}")))
      .send()
      .await
      .context("DELETE /students failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "DELETE /students").await);
    }
    Ok(())
  }

  /// `GET /api/students/{id}/dues?through=<month>[&amount=<n>]`
  pub async fn dues(&self, id: &str, through: YearMonth, amount: Option<u64>) -> Result<Dues> {
    let mut params = vec![("through", through.to_string())];
    if let Some(a) = amount {
      params.push(("amount", a.to_string()));
    }
    let resp = self
      .client
      .get(self.url(&format!("/students/{id}/dues")))
      .query(&params)
      .send()
      .await
      .context("GET /students/{id}/dues failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /dues").await);
    }
    resp.json().await.context("deserialising dues")
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  /// `GET /api/attendance/{date}`
  pub async fn attendance(&self, date: NaiveDate) -> Result<BTreeMap<String, AttendanceStatus>> {
    let resp = self
      .client
      .get(self.url(&format!("/attendance/{date}")))
      .send()
      .await
      .context("GET /attendance failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /attendance").await);
    }
    resp.json().await.context("deserialising attendance")
  }

  /// `PUT /api/attendance/{date}`: replaces every entry for the date.
  pub async fn set_attendance(
    &self,
    date: NaiveDate,
    statuses: &BTreeMap<String, AttendanceStatus>,
  ) -> Result<()> {
    let resp = self
      .client
      .put(self.url(&format!("/attendance/{date}")))
      .json(statuses)
      .send()
      .await
      .context("PUT /attendance failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "PUT /attendance").await);
    }
    Ok(())
  }

  // ── Payments and receipts ─────────────────────────────────────────────────

  /// `GET /api/payments[?q=<text>]`
  pub async fn list_payments(&self, query: Option<&str>) -> Result<Vec<Payment>> {
    let mut req = self.client.get(self.url("/payments"));
    if let Some(q) = query {
      req = req.query(&[("q", q)]);
    }
    let resp = req.send().await.context("GET /payments failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /payments").await);
    }
    resp.json().await.context("deserialising payments")
  }

  /// `POST /api/payments` with a `PaymentRequest` body.
  pub async fn record_payment(&self, body: &Value) -> Result<Payment> {
    let resp = self
      .client
      .post(self.url("/payments"))
      .json(body)
      .send()
      .await
      .context("POST /payments failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "POST /payments").await);
    }
    resp.json().await.context("deserialising payment")
  }

  /// `GET /api/receipts/{id}/text`
  pub async fn receipt_text(&self, id: &str) -> Result<String> {
    let resp = self
      .client
      .get(self.url(&format!("/receipts/{id}/text")))
      .send()
      .await
      .context("GET /receipts/{id}/text failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /receipts").await);
    }
    resp.text().await.context("reading receipt")
  }

  /// `GET /api/receipts/{id}/share`
  pub async fn share_link(&self, id: &str) -> Result<ShareLink> {
    let resp = self
      .client
      .get(self.url(&format!("/receipts/{id}/share")))
      .send()
      .await
      .context("GET /receipts/{id}/share failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /receipts/share").await);
    }
    resp.json().await.context("deserialising share link")
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  /// `GET /api/reports/{month}`
  pub async fn month_summary(&self, month: YearMonth) -> Result<MonthSummary> {
    let resp = self
      .client
      .get(self.url(&format!("/reports/{month}")))
      .send()
      .await
      .context("GET /reports failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /reports").await);
    }
    resp.json().await.context("deserialising month summary")
  }

  // ── Backup ────────────────────────────────────────────────────────────────

  /// `GET /api/backup`
  pub async fn export_backup(&self) -> Result<Backup> {
    let resp = self
      .client
      .get(self.url("/backup"))
      .send()
      .await
      .context("GET /backup failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "GET /backup").await);
    }
    let etag = resp
      .headers()
      .get(header::ETAG)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    let json = resp.text().await.context("reading backup")?;
    Ok(Backup { json, etag })
  }

  /// `POST /api/backup`, conditional on `if_match` when given.
  pub async fn import_backup(&self, json: String, if_match: Option<&str>) -> Result<Backup> {
    let mut req = self
      .client
      .post(self.url("/backup"))
      .header(header::CONTENT_TYPE, "application/json")
      .body(json);
    if let Some(tag) = if_match {
      req = req.header(header::IF_MATCH, tag);
    }
    let resp = req.send().await.context("POST /backup failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "POST /backup").await);
    }
    let etag = resp
      .headers()
      .get(header::ETAG)
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);
    let json = resp.text().await.context("reading imported record")?;
    Ok(Backup { json, etag })
  }

  /// `POST /api/reset`
  pub async fn reset(&self) -> Result<()> {
    let resp = self
      .client
      .post(self.url("/reset"))
      .send()
      .await
      .context("POST /reset failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "POST /reset").await);
    }
    Ok(())
  }

  // ── SMS ───────────────────────────────────────────────────────────────────

  /// `POST /api/send-sms`; returns the provider's message sid.
  pub async fn send_sms(&self, to: &str, body: &str) -> Result<String> {
    let resp = self
      .client
      .post(self.url("/send-sms"))
      .json(&serde_json::json!({ "to": to, "body": body }))
      .send()
      .await
      .context("POST /send-sms failed")?;

    if !resp.status().is_success() {
      return Err(failure(resp, "POST /send-sms").await);
    }
    let sent: SmsSent = resp.json().await.context("deserialising relay response")?;
    Ok(sent.sid)
  }
}
