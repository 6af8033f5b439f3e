//! Connection parameters and timings for a preflight run.
//!
//! `Config::default()` carries the fixed values the stores are provisioned with.
//! `Config::from_env()` additionally lets the host and port of each store be
//! overridden through `PREFLIGHT_<STORE>_HOST` / `PREFLIGHT_<STORE>_PORT`.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::consts::{
  ENV_PREFIX, SANITY_CACHE_KEY, SANITY_CACHE_VALUE, SEED_CACHE_KEY, SEED_CACHE_VALUE, SEED_COLLECTION,
  SEED_DATABASE, SEED_DOCUMENT_KEY, SEED_NAME, SEED_TABLE,
};
use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid port in {var}: {value:?}")]
  InvalidPort { var: String, value: String },
}

/// A host/port pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
  pub host: String,
  pub port: u16,
}

impl Address {
  pub fn new(host: impl Into<String>, port: u16) -> Self {
    Self {
      host: host.into(),
      port,
    }
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.host, self.port)
  }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  pub username: String,
  pub password: String,
}

impl Credentials {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
    }
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Document store (ArangoDB) settings.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
  pub address: Address,
  pub credentials: Credentials,
  pub database: String,
  pub collection: String,
  pub document_key: String,
  /// Value of the seeded document's `name` attribute.
  pub expected_name: String,
}

impl DocumentConfig {
  /// HTTP endpoint of the server, e.g. `http://arangodb:8529`.
  pub fn endpoint(&self) -> String {
    format!("http://{}", self.address)
  }
}

impl Default for DocumentConfig {
  fn default() -> Self {
    Self {
      address: Address::new("arangodb", 8529),
      credentials: Credentials::new("root", "rootpassword"),
      database: SEED_DATABASE.to_string(),
      collection: SEED_COLLECTION.to_string(),
      document_key: SEED_DOCUMENT_KEY.to_string(),
      expected_name: SEED_NAME.to_string(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SslMode {
  #[default]
  Disable,
  Prefer,
  Require,
}

/// Relational store (PostgreSQL) settings.
#[derive(Debug, Clone)]
pub struct RelationalConfig {
  pub address: Address,
  pub credentials: Credentials,
  pub ssl_mode: SslMode,
  /// Database the bootstrapper connects to before the target exists.
  pub admin_database: String,
  pub database: String,
  pub table: String,
  pub row_name: String,
}

impl Default for RelationalConfig {
  fn default() -> Self {
    Self {
      address: Address::new("postgres", 5432),
      credentials: Credentials::new("postgres", "yourpassword"),
      ssl_mode: SslMode::Disable,
      admin_database: "postgres".to_string(),
      database: SEED_DATABASE.to_string(),
      table: SEED_TABLE.to_string(),
      row_name: SEED_NAME.to_string(),
    }
  }
}

/// Cache (Redis) settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
  pub address: Address,
  /// Key/value pairs written without expiry, in order.
  pub entries: Vec<(String, String)>,
  /// Key read back by the verifier and its expected value.
  pub sanity_key: String,
  pub sanity_value: String,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      address: Address::new("redis", 6379),
      entries: vec![
        (SEED_CACHE_KEY.to_string(), SEED_CACHE_VALUE.to_string()),
        (SANITY_CACHE_KEY.to_string(), SANITY_CACHE_VALUE.to_string()),
      ],
      sanity_key: SANITY_CACHE_KEY.to_string(),
      sanity_value: SANITY_CACHE_VALUE.to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Timing {
  /// Timeout of a single reachability probe.
  pub probe_timeout: Duration,
  /// Deadline applied to every cache operation.
  pub cache_op_timeout: Duration,
  /// Reconnect policy of the document store verifier.
  pub document_retry: RetryPolicy,
  /// Upper bound for a verifier's timed round trip (inclusive).
  pub latency_threshold: Duration,
  /// How long the process stays up after a successful run.
  pub linger: Duration,
}

impl Default for Timing {
  fn default() -> Self {
    Self {
      probe_timeout: Duration::from_secs(2),
      cache_op_timeout: Duration::from_secs(5),
      document_retry: RetryPolicy::new(5, Duration::from_secs(5)),
      latency_threshold: Duration::from_secs(10),
      linger: Duration::from_secs(10),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
  pub document: DocumentConfig,
  pub relational: RelationalConfig,
  pub cache: CacheConfig,
  pub timing: Timing,
}

impl Config {
  /// Defaults with host/port overrides from the environment applied.
  pub fn from_env() -> Result<Self, ConfigError> {
    let mut config = Self::default();
    override_address(&mut config.document.address, "ARANGODB")?;
    override_address(&mut config.relational.address, "POSTGRES")?;
    override_address(&mut config.cache.address, "REDIS")?;
    Ok(config)
  }
}

fn override_address(address: &mut Address, store: &str) -> Result<(), ConfigError> {
  let host_var = format!("{}_{}_HOST", ENV_PREFIX, store);
  if let Ok(host) = std::env::var(&host_var)
    && !host.is_empty()
  {
    address.host = host;
  }

  let port_var = format!("{}_{}_PORT", ENV_PREFIX, store);
  if let Ok(value) = std::env::var(&port_var)
    && !value.trim().is_empty()
  {
    address.port = value.trim().parse().map_err(|_| ConfigError::InvalidPort {
      var: port_var,
      value,
    })?;
  }

  Ok(())
}
