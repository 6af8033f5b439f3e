//! Minimal ArangoDB HTTP client.
//!
//! Covers the handful of REST endpoints the document bootstrapper and verifier
//! need: server version, database/collection existence and creation, and
//! single-document read and insert.

mod client;

use serde::Deserialize;
use thiserror::Error;

pub use client::ArangoClient;

/// A JSON document as stored in a collection.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// `errorNum` ArangoDB reports for a missing document.
pub const ERROR_DOCUMENT_NOT_FOUND: i64 = 1202;
/// `errorNum` ArangoDB reports for a missing collection.
pub const ERROR_COLLECTION_NOT_FOUND: i64 = 1203;
/// `errorNum` ArangoDB reports for a missing database.
pub const ERROR_DATABASE_NOT_FOUND: i64 = 1228;

#[derive(Debug, Error)]
pub enum ArangoError {
  #[error("http request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid endpoint {endpoint}: {message}")]
  InvalidEndpoint { endpoint: String, message: String },

  /// Credentials were rejected.
  #[error("authentication failed (HTTP {code})")]
  Unauthorized { code: u16 },

  /// The server answered with an error body.
  #[error("{message} (HTTP {code}, errorNum {error_num})")]
  Api { code: u16, error_num: i64, message: String },

  #[error("invalid response: {0}")]
  InvalidResponse(String),
}

impl ArangoError {
  pub fn not_found(error_num: i64, message: impl Into<String>) -> Self {
    ArangoError::Api {
      code: 404,
      error_num,
      message: message.into(),
    }
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, ArangoError::Api { code: 404, .. })
  }
}

/// Body of `GET /_api/version`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerVersion {
  pub server: String,
  pub version: String,
  #[serde(default)]
  pub license: Option<String>,
}
