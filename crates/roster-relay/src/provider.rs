//! The provider seam.

use std::future::Future;

/// A rejection reported by an [`SmsProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
  /// HTTP status reported by the provider, if any.
  pub status:  Option<u16>,
  pub message: String,
}

impl ProviderError {
  pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
    Self { status, message: message.into() }
  }
}

/// Something that can deliver a text message.
pub trait SmsProvider: Send + Sync {
  /// Send `body` to `to` (E.164). Returns the provider's message id.
  fn send(
    &self,
    to: &str,
    body: &str,
  ) -> impl Future<Output = Result<String, ProviderError>> + Send;
}
