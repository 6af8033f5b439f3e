//! Outcomes of the individual stages, handed to the caller as each completes.

use std::time::Duration;

use crate::arango::ServerVersion;

/// Whether a resource had to be created or was already in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
  Created,
  AlreadyPresent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSetup {
  pub database: String,
  pub database_state: Provision,
  pub collection: String,
  pub collection_state: Provision,
  pub document_key: String,
  pub document_state: Provision,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalSetup {
  pub database: String,
  pub database_state: Provision,
  pub table: String,
  /// Rows written by this run; zero when the seed row was already there.
  pub rows_inserted: u64,
}

impl RelationalSetup {
  pub fn row_state(&self) -> Provision {
    if self.rows_inserted > 0 {
      Provision::Created
    } else {
      Provision::AlreadyPresent
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSetup {
  pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentVerified {
  /// Connection attempts it took to reach the server.
  pub attempts: u32,
  pub server: ServerVersion,
  pub document_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalVerified {
  pub table: String,
  pub matching_rows: i64,
  pub latency: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheVerified {
  pub pong: String,
  pub key: String,
  pub latency: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageReport {
  DocumentSetup(DocumentSetup),
  RelationalSetup(RelationalSetup),
  CacheSetup(CacheSetup),
  DocumentVerified(DocumentVerified),
  RelationalVerified(RelationalVerified),
  CacheVerified(CacheVerified),
}
