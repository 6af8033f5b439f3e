//! Cache (Redis) bootstrap and verification.

mod bootstrap;
mod redis_client;
mod verify;

pub use bootstrap::bootstrap;
pub use redis_client::{RedisBackend, RedisConnection};
pub use verify::verify;

use std::time::Duration;

use thiserror::Error;

use crate::config::Address;

#[derive(Debug, Error)]
pub enum CacheError {
  #[error(transparent)]
  Redis(#[from] redis::RedisError),

  #[error("{operation} timed out after {after:?}")]
  Timeout { operation: String, after: Duration },

  #[error("key '{key}' not found")]
  KeyNotFound { key: String },
}

/// Opens connections to the cache.
#[allow(async_fn_in_trait)]
pub trait CacheBackend {
  type Connection: CacheConnection;

  /// Address checked by the reachability probe.
  fn address(&self) -> &Address;

  async fn connect(&self) -> Result<Self::Connection, CacheError>;
}

#[allow(async_fn_in_trait)]
pub trait CacheConnection {
  /// `PING`; returns the server's reply (normally `PONG`).
  async fn ping(&mut self) -> Result<String, CacheError>;

  /// `GET`; `None` when the key is absent.
  async fn get(&mut self, key: &str) -> Result<Option<String>, CacheError>;

  /// `SET` without expiry.
  async fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError>;
}
