use serde_json::Value;
use tracing::info;

use super::{DocumentBackend, DocumentClient};
use crate::arango::ArangoError;
use crate::config::DocumentConfig;
use crate::error::{CheckError, Store};
use crate::report::DocumentVerified;
use crate::retry::{RetryPolicy, retry};

/// Reconnect to the document store and check the seeded document.
///
/// Each attempt builds a new client and asks for the server version; the
/// first attempt that answers wins. Afterwards the database and collection
/// must open and the seed document must carry the expected `name`.
pub async fn verify<B: DocumentBackend>(
  backend: &B,
  config: &DocumentConfig,
  policy: &RetryPolicy,
) -> Result<DocumentVerified, CheckError> {
  let connected = retry(policy, "ArangoDB connection", |_| async move {
    let client = backend.connect().await?;
    let server = client.version().await?;
    Ok::<_, ArangoError>((client, server))
  })
  .await
  .map_err(|exhausted| CheckError::RetriesExhausted {
    store: Store::Document,
    attempts: exhausted.attempts,
    source: exhausted.last,
  })?;
  let attempts = connected.attempts;
  let (client, server) = connected.value;
  info!(attempts, version = %server.version, "connected to ArangoDB");

  let database = &config.database;
  client
    .open_database(database)
    .await
    .map_err(|e| CheckError::document(format!("open ArangoDB database '{}'", database), e))?;

  let collection = &config.collection;
  client
    .open_collection(database, collection)
    .await
    .map_err(|e| CheckError::document(format!("open ArangoDB collection '{}'", collection), e))?;

  let key = &config.document_key;
  let document = client
    .read_document(database, collection, key)
    .await
    .map_err(|e| CheckError::document(format!("read ArangoDB test document '{}'", key), e))?;

  let name_matches = matches!(document.get("name"), Some(Value::String(name)) if *name == config.expected_name);
  if !name_matches {
    return Err(CheckError::Integrity {
      store: Store::Document,
      what: format!("test document '{}'", key),
      actual: Value::Object(document).to_string(),
    });
  }

  info!(key = %key, "ArangoDB document validated");
  Ok(DocumentVerified {
    attempts,
    server,
    document_key: key.clone(),
  })
}
