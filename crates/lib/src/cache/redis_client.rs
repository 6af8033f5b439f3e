use std::future::Future;
use std::time::Duration;

use redis::aio::MultiplexedConnection;
use tokio::time::timeout;
use tracing::debug;

use super::{CacheBackend, CacheConnection, CacheError};
use crate::config::Address;

/// Production backend: a multiplexed Redis connection with a deadline on every call.
#[derive(Debug, Clone)]
pub struct RedisBackend {
  address: Address,
  op_timeout: Duration,
}

impl RedisBackend {
  pub fn new(address: &Address, op_timeout: Duration) -> Self {
    Self {
      address: address.clone(),
      op_timeout,
    }
  }

  pub fn url(&self) -> String {
    format!("redis://{}/", self.address)
  }
}

impl CacheBackend for RedisBackend {
  type Connection = RedisConnection;

  fn address(&self) -> &Address {
    &self.address
  }

  async fn connect(&self) -> Result<RedisConnection, CacheError> {
    debug!(address = %self.address, "connecting to Redis");
    let client = redis::Client::open(self.url())?;
    let conn = deadline("connect", self.op_timeout, client.get_multiplexed_async_connection()).await?;
    Ok(RedisConnection {
      conn,
      op_timeout: self.op_timeout,
    })
  }
}

pub struct RedisConnection {
  conn: MultiplexedConnection,
  op_timeout: Duration,
}

impl CacheConnection for RedisConnection {
  async fn ping(&mut self) -> Result<String, CacheError> {
    let cmd = redis::cmd("PING");
    deadline("PING", self.op_timeout, cmd.query_async::<String>(&mut self.conn)).await
  }

  async fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
    let mut cmd = redis::cmd("GET");
    cmd.arg(key);
    deadline("GET", self.op_timeout, cmd.query_async::<Option<String>>(&mut self.conn)).await
  }

  async fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);
    deadline("SET", self.op_timeout, cmd.query_async::<()>(&mut self.conn)).await
  }
}

/// Run a Redis call, failing with [`CacheError::Timeout`] once `limit` passes.
async fn deadline<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T, CacheError>
where
  F: Future<Output = redis::RedisResult<T>>,
{
  match timeout(limit, fut).await {
    Ok(result) => result.map_err(CacheError::from),
    Err(_) => Err(CacheError::Timeout {
      operation: operation.to_string(),
      after: limit,
    }),
  }
}
