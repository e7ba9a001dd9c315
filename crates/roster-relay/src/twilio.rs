//! [`TwilioProvider`]: delivery through the Twilio Messages REST API.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::provider::{ProviderError, SmsProvider};

fn default_api_base() -> String { "https://api.twilio.com".to_owned() }

/// Provider credentials, usually the `[sms]` section of the server config.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
  pub account_sid: String,
  pub auth_token:  String,
  /// Sender number in E.164 form.
  pub from_number: String,
  #[serde(default = "default_api_base")]
  pub api_base:    String,
}

impl SmsConfig {
  /// All three credentials present and non-empty.
  pub fn is_complete(&self) -> bool {
    !(self.account_sid.is_empty() || self.auth_token.is_empty() || self.from_number.is_empty())
  }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
  sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResource {
  message: Option<String>,
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct TwilioProvider {
  client: Client,
  config: SmsConfig,
}

impl TwilioProvider {
  pub fn new(config: SmsConfig) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, config })
  }

  fn messages_url(&self) -> String {
    format!(
      "{}/2010-04-01/Accounts/{}/Messages.json",
      self.config.api_base.trim_end_matches('/'),
      self.config.account_sid
    )
  }
}

impl SmsProvider for TwilioProvider {
  async fn send(&self, to: &str, body: &str) -> Result<String, ProviderError> {
    let resp = self
      .client
      .post(self.messages_url())
      .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
      .form(&[("To", to), ("From", self.config.from_number.as_str()), ("Body", body)])
      .send()
      .await
      .map_err(|e| ProviderError::new(e.status().map(|s| s.as_u16()), e.to_string()))?;

    let status = resp.status();
    if status.is_success() {
      let message: MessageResource = resp
        .json()
        .await
        .map_err(|e| ProviderError::new(None, format!("unexpected provider response: {e}")))?;
      return Ok(message.sid);
    }

    let message = resp
      .json::<ErrorResource>()
      .await
      .ok()
      .and_then(|e| e.message)
      .unwrap_or_else(|| format!("provider answered {status}"));
    Err(ProviderError::new(Some(status.as_u16()), message))
  }
}
