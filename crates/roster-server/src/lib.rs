//! Process wiring for the Roster server.
//!
//! Loads [`ServerConfig`], and composes the REST API and the SMS relay into
//! one axum [`Router`] under `/api`.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use config::{ConfigError, Environment, Source};
use roster_api::api_router;
use roster_core::{receipt::Institute, store::RecordStore};
use roster_relay::{SmsConfig, SmsProvider, relay_router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("roster.db") }

/// Runtime server configuration, deserialised from `roster.toml` and
/// `ROSTER_*` environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub institute:  Institute,
  #[serde(default)]
  pub sms:        Option<SmsConfig>,
}

impl ServerConfig {
  /// Read the optional file at `path`, overlaid with the process
  /// environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let file = config::File::from(path).required(false);
    Self::from_sources(file, None)
  }

  /// Layer `env` (the process environment when `None`) over `file`.
  ///
  /// `ROSTER_PORT=8080` sets `port`; nested keys use `__`, as in
  /// `ROSTER_SMS__AUTH_TOKEN`. Without an `[sms]` section the legacy
  /// `TWILIO_*` variables are consulted.
  pub fn from_sources<F>(
    file: F,
    env: Option<HashMap<String, String>>,
  ) -> Result<Self, ConfigError>
  where
    F: Source + Send + Sync + 'static,
  {
    let mut config: ServerConfig = config::Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("ROSTER")
          .prefix_separator("_")
          .separator("__")
          .source(env.clone()),
      )
      .build()?
      .try_deserialize()?;

    if config.sms.is_none() {
      let var = |key: &str| match &env {
        Some(map) => map.get(key).cloned(),
        None => std::env::var(key).ok(),
      };
      config.sms = twilio_from_env(var);
    }
    Ok(config)
  }
}

/// An [`SmsConfig`] from `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and
/// `TWILIO_PHONE_NUMBER`, when any of them is set.
fn twilio_from_env(var: impl Fn(&str) -> Option<String>) -> Option<SmsConfig> {
  let account_sid = var("TWILIO_ACCOUNT_SID");
  let auth_token = var("TWILIO_AUTH_TOKEN");
  let from_number = var("TWILIO_PHONE_NUMBER");
  if account_sid.is_none() && auth_token.is_none() && from_number.is_none() {
    return None;
  }
  Some(SmsConfig {
    account_sid: account_sid.unwrap_or_default(),
    auth_token:  auth_token.unwrap_or_default(),
    from_number: from_number.unwrap_or_default(),
    api_base:    "https://api.twilio.com".to_owned(),
  })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The whole HTTP surface: REST API and SMS relay, both under `/api`.
///
/// `provider` is `None` when SMS is not configured; the relay then answers
/// 503.
pub fn app<S, P>(store: Arc<S>, institute: Institute, provider: Option<Arc<P>>) -> Router
where
  S: RecordStore + 'static,
  P: SmsProvider + 'static,
{
  let api = api_router(store, institute).merge(relay_router(provider));
  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}
