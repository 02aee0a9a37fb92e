//! Error types for the review boundary.
//!
//! `ConfigError` is fatal for an evaluation attempt and is surfaced to callers.
//! `ReviewError` never leaves `ReviewClient::evaluate`: it is logged and folded
//! into the fallback result.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("evaluation credential missing: set {var}")]
  MissingCredential { var: String },
  #[error("failed to build HTTP client: {0}")]
  HttpClient(String),
}

#[derive(Debug, Error)]
pub enum ReviewError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("evaluation service HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("empty response from evaluation service")]
  EmptyBody,
  #[error("malformed review payload: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("review payload missing required field `{0}`")]
  MissingField(&'static str),
  #[error("no response within {0:?}")]
  Timeout(Duration),
}
