//! Relational store (PostgreSQL) bootstrap and verification.

mod bootstrap;
mod postgres;
mod verify;

pub use bootstrap::bootstrap;
pub use postgres::{PostgresBackend, PostgresSession, quote_ident};
pub use verify::verify;

use thiserror::Error;
use tracing::warn;

use crate::config::Address;

#[derive(Debug, Error)]
pub enum RelationalError {
  #[error(transparent)]
  Sqlx(#[from] sqlx::Error),

  #[error("database \"{name}\" already exists")]
  DuplicateDatabase { name: String },
}

impl RelationalError {
  pub fn is_duplicate_database(&self) -> bool {
    matches!(self, RelationalError::DuplicateDatabase { .. })
  }
}

/// Opens sessions against named databases on one server.
#[allow(async_fn_in_trait)]
pub trait RelationalBackend {
  type Session: RelationalSession;

  /// Address checked by the reachability probe.
  fn address(&self) -> &Address;

  async fn connect(&self, database: &str) -> Result<Self::Session, RelationalError>;
}

/// One open connection. Must be handed to [`RelationalSession::close`] when done.
#[allow(async_fn_in_trait)]
pub trait RelationalSession {
  /// Fails with [`RelationalError::DuplicateDatabase`] if `name` already exists.
  async fn create_database(&mut self, name: &str) -> Result<(), RelationalError>;

  /// Create `table (id SERIAL PRIMARY KEY, name TEXT NOT NULL)` unless it exists.
  async fn create_table(&mut self, table: &str) -> Result<(), RelationalError>;

  /// Insert a row named `name` unless one is already there; returns rows written.
  async fn insert_row(&mut self, table: &str, name: &str) -> Result<u64, RelationalError>;

  async fn ping(&mut self) -> Result<(), RelationalError>;

  async fn table_exists(&mut self, table: &str) -> Result<bool, RelationalError>;

  async fn count_rows(&mut self, table: &str, name: &str) -> Result<i64, RelationalError>;

  async fn close(self) -> Result<(), RelationalError>;
}

/// Close a session, logging instead of failing if the server is already gone.
pub(crate) async fn release<S: RelationalSession>(session: S) {
  if let Err(err) = session.close().await {
    warn!(error = %err, "failed to close PostgreSQL connection");
  }
}
