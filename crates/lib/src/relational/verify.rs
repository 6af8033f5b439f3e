use std::time::Duration;

use tracing::info;

use super::{RelationalBackend, RelationalSession, release};
use crate::config::RelationalConfig;
use crate::error::{CheckError, Store};
use crate::latency::{check_latency, timed};
use crate::report::RelationalVerified;

/// Check that the seed table and row are present and the server answers quickly.
pub async fn verify<B: RelationalBackend>(
  backend: &B,
  config: &RelationalConfig,
  threshold: Duration,
) -> Result<RelationalVerified, CheckError> {
  let mut session = backend
    .connect(&config.database)
    .await
    .map_err(|e| CheckError::relational("connect to PostgreSQL", e))?;
  let checked = check(&mut session, config, threshold).await;
  release(session).await;
  checked
}

async fn check<S: RelationalSession>(
  session: &mut S,
  config: &RelationalConfig,
  threshold: Duration,
) -> Result<RelationalVerified, CheckError> {
  session
    .ping()
    .await
    .map_err(|e| CheckError::relational("ping PostgreSQL", e))?;

  let table = &config.table;
  let exists = session
    .table_exists(table)
    .await
    .map_err(|e| CheckError::relational("check PostgreSQL table existence", e))?;
  if !exists {
    return Err(CheckError::missing(Store::Relational, format!("table '{}'", table)));
  }

  let matching_rows = session
    .count_rows(table, &config.row_name)
    .await
    .map_err(|e| CheckError::relational("validate PostgreSQL test row", e))?;
  if matching_rows == 0 {
    return Err(CheckError::missing(
      Store::Relational,
      format!("test row with name '{}'", config.row_name),
    ));
  }

  let (pinged, latency) = timed(session.ping()).await;
  pinged.map_err(|e| CheckError::relational("ping PostgreSQL for response time", e))?;
  check_latency(Store::Relational, latency, threshold)?;

  info!(table = %table, matching_rows, ?latency, "PostgreSQL state validated");
  Ok(RelationalVerified {
    table: table.clone(),
    matching_rows,
    latency,
  })
}
