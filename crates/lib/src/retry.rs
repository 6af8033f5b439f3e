//! Bounded retry with a fixed delay between attempts.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total number of attempts, including the first. Treated as at least 1.
  pub attempts: u32,
  /// Sleep between a failed attempt and the next one.
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn new(attempts: u32, delay: Duration) -> Self {
    Self { attempts, delay }
  }
}

/// Value produced by the attempt that succeeded.
#[derive(Debug)]
pub struct Retried<T> {
  pub value: T,
  /// 1-based number of the successful attempt.
  pub attempts: u32,
}

/// Every attempt failed; carries the error of the last one.
#[derive(Debug)]
pub struct Exhausted<E> {
  pub attempts: u32,
  pub last: E,
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. There is no sleep after the final
/// failed attempt.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<Retried<T>, Exhausted<E>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: fmt::Display,
{
  let attempts = policy.attempts.max(1);
  let mut attempt = 1;

  loop {
    match op(attempt).await {
      Ok(value) => {
        return Ok(Retried {
          value,
          attempts: attempt,
        });
      }
      Err(err) if attempt < attempts => {
        warn!(attempt, max = attempts, error = %err, "{} failed, retrying", what);
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
      }
      Err(err) => {
        warn!(attempt, max = attempts, error = %err, "{} failed, giving up", what);
        return Err(Exhausted { attempts: attempt, last: err });
      }
    }
  }
}
