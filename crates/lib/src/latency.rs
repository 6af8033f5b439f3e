//! Round-trip timing for the verifiers' latency sanity check.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{CheckError, Store};

/// Await `fut` and return its output together with the wall time it took.
pub async fn timed<F: Future>(fut: F) -> (F::Output, Duration) {
  let start = Instant::now();
  let output = fut.await;
  (output, start.elapsed())
}

/// A round trip passes when it took at most `threshold`.
pub fn within_threshold(elapsed: Duration, threshold: Duration) -> bool {
  elapsed <= threshold
}

pub fn check_latency(store: Store, elapsed: Duration, threshold: Duration) -> Result<(), CheckError> {
  if within_threshold(elapsed, threshold) {
    Ok(())
  } else {
    Err(CheckError::Latency {
      store,
      elapsed,
      threshold,
    })
  }
}
