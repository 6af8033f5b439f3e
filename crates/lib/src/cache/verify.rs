use std::time::Duration;

use tracing::info;

use super::{CacheBackend, CacheConnection, CacheError};
use crate::config::CacheConfig;
use crate::error::{CheckError, Store};
use crate::latency::{check_latency, timed};
use crate::report::CacheVerified;

/// Ping the cache, read back the sanity key and time one more round trip.
pub async fn verify<B: CacheBackend>(
  backend: &B,
  config: &CacheConfig,
  threshold: Duration,
) -> Result<CacheVerified, CheckError> {
  let mut conn = backend
    .connect()
    .await
    .map_err(|e| CheckError::cache("connect to Redis", e))?;

  let pong = conn.ping().await.map_err(|e| CheckError::cache("ping Redis", e))?;
  info!(response = %pong, "Redis ping response");

  let key = &config.sanity_key;
  let read_action = || format!("retrieve Redis sanity check key '{}'", key);
  let value = conn
    .get(key)
    .await
    .map_err(|e| CheckError::cache(read_action(), e))?
    .ok_or_else(|| CheckError::cache(read_action(), CacheError::KeyNotFound { key: key.clone() }))?;
  if value != config.sanity_value {
    return Err(CheckError::Integrity {
      store: Store::Cache,
      what: format!("sanity check key '{}'", key),
      actual: value,
    });
  }

  let (pinged, latency) = timed(conn.ping()).await;
  pinged.map_err(|e| CheckError::cache("ping Redis for response time", e))?;
  check_latency(Store::Cache, latency, threshold)?;

  info!(key = %key, ?latency, "Redis state validated");
  Ok(CacheVerified {
    pong,
    key: key.clone(),
    latency,
  })
}
