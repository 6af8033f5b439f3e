use std::time::Duration;

use tracing::info;

use super::{CacheBackend, CacheConnection};
use crate::config::CacheConfig;
use crate::error::{CheckError, Store};
use crate::probe::is_port_open;
use crate::report::CacheSetup;

/// Write every seed entry without expiry.
pub async fn bootstrap<B: CacheBackend>(
  backend: &B,
  config: &CacheConfig,
  probe_timeout: Duration,
) -> Result<CacheSetup, CheckError> {
  if !is_port_open(backend.address(), probe_timeout).await {
    return Err(CheckError::Unreachable {
      store: Store::Cache,
      address: backend.address().clone(),
    });
  }

  let mut conn = backend
    .connect()
    .await
    .map_err(|e| CheckError::cache("connect to Redis", e))?;

  let mut keys = Vec::with_capacity(config.entries.len());
  for (key, value) in &config.entries {
    conn
      .set(key, value)
      .await
      .map_err(|e| CheckError::cache(format!("set Redis key '{}'", key), e))?;
    info!(key = %key, "Redis key set");
    keys.push(key.clone());
  }

  Ok(CacheSetup { keys })
}
