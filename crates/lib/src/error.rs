//! Errors raised by the bootstrappers and verifiers.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::arango::ArangoError;
use crate::cache::CacheError;
use crate::config::Address;
use crate::relational::RelationalError;

/// The external store a check runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
  Document,
  Relational,
  Cache,
}

impl Store {
  pub fn as_str(&self) -> &'static str {
    match self {
      Store::Document => "ArangoDB",
      Store::Relational => "PostgreSQL",
      Store::Cache => "Redis",
    }
  }
}

impl fmt::Display for Store {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Failure of a single bootstrap or verification routine.
#[derive(Debug, Error)]
pub enum CheckError {
  /// The reachability probe could not open a connection.
  #[error("{store} port {} is not open or accessible at {address}", .address.port)]
  Unreachable { store: Store, address: Address },

  #[error("failed to {action}: {source}")]
  Document {
    action: String,
    #[source]
    source: ArangoError,
  },

  #[error("failed to {action}: {source}")]
  Relational {
    action: String,
    #[source]
    source: RelationalError,
  },

  #[error("failed to {action}: {source}")]
  Cache {
    action: String,
    #[source]
    source: CacheError,
  },

  /// The reconnect loop ran out of attempts.
  #[error("failed to connect to {store} after {attempts} attempt(s): {source}")]
  RetriesExhausted {
    store: Store,
    attempts: u32,
    #[source]
    source: ArangoError,
  },

  /// Seeded state is absent.
  #[error("{store} {what} does not exist")]
  Missing { store: Store, what: String },

  /// Seeded state is present but holds the wrong value.
  #[error("{store} {what} has unexpected data: {actual}")]
  Integrity {
    store: Store,
    what: String,
    actual: String,
  },

  #[error("{store} query response time is too high: {elapsed:?} (threshold {threshold:?})")]
  Latency {
    store: Store,
    elapsed: Duration,
    threshold: Duration,
  },
}

impl CheckError {
  pub fn document(action: impl Into<String>, source: ArangoError) -> Self {
    CheckError::Document {
      action: action.into(),
      source,
    }
  }

  pub fn relational(action: impl Into<String>, source: RelationalError) -> Self {
    CheckError::Relational {
      action: action.into(),
      source,
    }
  }

  pub fn cache(action: impl Into<String>, source: CacheError) -> Self {
    CheckError::Cache {
      action: action.into(),
      source,
    }
  }

  pub fn missing(store: Store, what: impl Into<String>) -> Self {
    CheckError::Missing {
      store,
      what: what.into(),
    }
  }
}
