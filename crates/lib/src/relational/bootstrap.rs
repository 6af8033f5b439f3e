use std::time::Duration;

use tracing::info;

use super::{RelationalBackend, RelationalSession, release};
use crate::config::RelationalConfig;
use crate::error::{CheckError, Store};
use crate::probe::is_port_open;
use crate::report::{Provision, RelationalSetup};

/// Ensure the seed database, table and row exist.
///
/// Uses two connections: one to the admin database to create the target
/// database, and one to the target to create the table and row. Both are
/// closed before returning, whatever the outcome.
pub async fn bootstrap<B: RelationalBackend>(
  backend: &B,
  config: &RelationalConfig,
  probe_timeout: Duration,
) -> Result<RelationalSetup, CheckError> {
  if !is_port_open(backend.address(), probe_timeout).await {
    return Err(CheckError::Unreachable {
      store: Store::Relational,
      address: backend.address().clone(),
    });
  }

  let mut admin = backend
    .connect(&config.admin_database)
    .await
    .map_err(|e| CheckError::relational("connect to PostgreSQL", e))?;
  let created = admin.create_database(&config.database).await;
  release(admin).await;

  let database_state = match created {
    Ok(()) => {
      info!(database = %config.database, "PostgreSQL database created");
      Provision::Created
    }
    Err(err) if err.is_duplicate_database() => {
      info!(database = %config.database, "PostgreSQL database already exists");
      Provision::AlreadyPresent
    }
    Err(err) => return Err(CheckError::relational("create PostgreSQL database", err)),
  };

  let mut session = backend.connect(&config.database).await.map_err(|e| {
    CheckError::relational(format!("connect to PostgreSQL database '{}'", config.database), e)
  })?;
  let seeded = seed(&mut session, config).await;
  release(session).await;
  let rows_inserted = seeded?;

  Ok(RelationalSetup {
    database: config.database.clone(),
    database_state,
    table: config.table.clone(),
    rows_inserted,
  })
}

async fn seed<S: RelationalSession>(session: &mut S, config: &RelationalConfig) -> Result<u64, CheckError> {
  session
    .create_table(&config.table)
    .await
    .map_err(|e| CheckError::relational("create PostgreSQL table", e))?;
  info!(table = %config.table, "PostgreSQL table created or already exists");

  let inserted = session
    .insert_row(&config.table, &config.row_name)
    .await
    .map_err(|e| CheckError::relational("insert test row into PostgreSQL table", e))?;
  info!(table = %config.table, inserted, "PostgreSQL test row ensured");

  Ok(inserted)
}
