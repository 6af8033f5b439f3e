//! TCP reachability probe used to gate every bootstrapper.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::Address;

/// Returns true if a TCP connection to `address` can be opened within `limit`.
///
/// Resolution failures, refused connections and timeouts all count as
/// unreachable. The connection is dropped as soon as it is established.
pub async fn is_port_open(address: &Address, limit: Duration) -> bool {
  let target = (address.host.as_str(), address.port);
  match timeout(limit, TcpStream::connect(target)).await {
    Ok(Ok(stream)) => {
      drop(stream);
      debug!(%address, "port is open");
      true
    }
    Ok(Err(err)) => {
      debug!(%address, error = %err, "port is not reachable");
      false
    }
    Err(_) => {
      debug!(%address, timeout = ?limit, "port probe timed out");
      false
    }
  }
}
