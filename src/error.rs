use std::time::Duration;

use thiserror::Error;

/// Raised by the `timeout` operator when no event arrived in time.
///
/// Streams that use `timeout` carry an error type that can be built from
/// this one (`Err: From<TimeoutError>`), which keeps the timeout
/// distinguishable from producer errors in `catch` and `retry_when` logic.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no event within {due:?}")]
pub struct TimeoutError {
  pub due: Duration,
}

/// A ready-made stream error type for code that mixes producer failures
/// with timeouts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
  #[error(transparent)]
  Timeout(#[from] TimeoutError),
  #[error("{0}")]
  Producer(String),
}

impl StreamError {
  pub fn producer(msg: impl Into<String>) -> Self { StreamError::Producer(msg.into()) }

  pub fn is_timeout(&self) -> bool { matches!(self, StreamError::Timeout(_)) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxflow_macro::test]
  fn timeout_is_distinguishable() {
    let err: StreamError = TimeoutError { due: Duration::from_millis(5) }.into();
    assert!(err.is_timeout());
    assert!(!StreamError::producer("boom").is_timeout());
    assert_eq!(StreamError::producer("boom").to_string(), "boom");
    assert_eq!(err.to_string(), "no event within 5ms");
  }
}
