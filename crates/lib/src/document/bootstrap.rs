use std::time::Duration;

use serde_json::Value;
use tracing::info;

use super::{DocumentBackend, DocumentClient};
use crate::arango::Document;
use crate::config::DocumentConfig;
use crate::error::{CheckError, Store};
use crate::probe::is_port_open;
use crate::report::{DocumentSetup, Provision};

/// Ensure the seed database, collection and document exist.
///
/// Each resource is created only when absent, so running this twice leaves
/// the store unchanged the second time. A missing document is the only read
/// error that is tolerated.
pub async fn bootstrap<B: DocumentBackend>(
  backend: &B,
  config: &DocumentConfig,
  probe_timeout: Duration,
) -> Result<DocumentSetup, CheckError> {
  if !is_port_open(backend.address(), probe_timeout).await {
    return Err(CheckError::Unreachable {
      store: Store::Document,
      address: backend.address().clone(),
    });
  }

  let client = backend
    .connect()
    .await
    .map_err(|e| CheckError::document("create ArangoDB client", e))?;

  let database = &config.database;
  let database_state = if client
    .database_exists(database)
    .await
    .map_err(|e| CheckError::document("check ArangoDB database existence", e))?
  {
    info!(database = %database, "ArangoDB database already exists");
    Provision::AlreadyPresent
  } else {
    client
      .create_database(database)
      .await
      .map_err(|e| CheckError::document(format!("create ArangoDB database '{}'", database), e))?;
    info!(database = %database, "ArangoDB database created");
    Provision::Created
  };

  client
    .open_database(database)
    .await
    .map_err(|e| CheckError::document(format!("open ArangoDB database '{}'", database), e))?;

  let collection = &config.collection;
  let collection_state = if client
    .collection_exists(database, collection)
    .await
    .map_err(|e| CheckError::document("check ArangoDB collection existence", e))?
  {
    info!(collection = %collection, "ArangoDB collection already exists");
    Provision::AlreadyPresent
  } else {
    client
      .create_collection(database, collection)
      .await
      .map_err(|e| CheckError::document(format!("create ArangoDB collection '{}'", collection), e))?;
    info!(collection = %collection, "ArangoDB collection created");
    Provision::Created
  };

  client
    .open_collection(database, collection)
    .await
    .map_err(|e| CheckError::document(format!("access ArangoDB collection '{}'", collection), e))?;

  let key = &config.document_key;
  let document_state = match client.read_document(database, collection, key).await {
    Ok(_) => {
      info!(key = %key, "ArangoDB test document already exists, skipping insertion");
      Provision::AlreadyPresent
    }
    Err(err) if err.is_not_found() => {
      client
        .create_document(database, collection, &seed_document(config))
        .await
        .map_err(|e| CheckError::document("insert test document into ArangoDB collection", e))?;
      info!(key = %key, "ArangoDB test document inserted");
      Provision::Created
    }
    Err(err) => return Err(CheckError::document("check for existing ArangoDB document", err)),
  };

  Ok(DocumentSetup {
    database: database.clone(),
    database_state,
    collection: collection.clone(),
    collection_state,
    document_key: key.clone(),
    document_state,
  })
}

fn seed_document(config: &DocumentConfig) -> Document {
  let mut document = Document::new();
  document.insert("_key".to_string(), Value::String(config.document_key.clone()));
  document.insert("name".to_string(), Value::String(config.expected_name.clone()));
  document
}
