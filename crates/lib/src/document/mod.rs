//! Document store (ArangoDB) bootstrap and verification.
//!
//! The routines are written against [`DocumentBackend`] / [`DocumentClient`]
//! so they can run against the real HTTP client or an in-memory fake.

mod bootstrap;
mod verify;

pub use bootstrap::bootstrap;
pub use verify::verify;

use crate::arango::{ArangoClient, ArangoError, Document, ServerVersion};
use crate::config::{Address, Credentials, DocumentConfig};

/// Something that can hand out authenticated document store clients.
#[allow(async_fn_in_trait)]
pub trait DocumentBackend {
  type Client: DocumentClient;

  /// Address checked by the reachability probe.
  fn address(&self) -> &Address;

  /// Open a new connection and authenticated client.
  async fn connect(&self) -> Result<Self::Client, ArangoError>;
}

/// Operations the bootstrapper and verifier issue against the document store.
///
/// `open_database` and `open_collection` fail with a not-found error when the
/// resource is absent; `read_document` does the same for a missing key.
#[allow(async_fn_in_trait)]
pub trait DocumentClient {
  async fn version(&self) -> Result<ServerVersion, ArangoError>;
  async fn database_exists(&self, name: &str) -> Result<bool, ArangoError>;
  async fn create_database(&self, name: &str) -> Result<(), ArangoError>;
  async fn open_database(&self, name: &str) -> Result<(), ArangoError>;
  async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, ArangoError>;
  async fn create_collection(&self, database: &str, name: &str) -> Result<(), ArangoError>;
  async fn open_collection(&self, database: &str, name: &str) -> Result<(), ArangoError>;
  async fn read_document(&self, database: &str, collection: &str, key: &str) -> Result<Document, ArangoError>;
  async fn create_document(&self, database: &str, collection: &str, document: &Document) -> Result<(), ArangoError>;
}

impl DocumentClient for ArangoClient {
  async fn version(&self) -> Result<ServerVersion, ArangoError> {
    ArangoClient::version(self).await
  }

  async fn database_exists(&self, name: &str) -> Result<bool, ArangoError> {
    ArangoClient::database_exists(self, name).await
  }

  async fn create_database(&self, name: &str) -> Result<(), ArangoError> {
    ArangoClient::create_database(self, name).await
  }

  async fn open_database(&self, name: &str) -> Result<(), ArangoError> {
    self.database(name).await
  }

  async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, ArangoError> {
    ArangoClient::collection_exists(self, database, name).await
  }

  async fn create_collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    ArangoClient::create_collection(self, database, name).await
  }

  async fn open_collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    self.collection(database, name).await
  }

  async fn read_document(&self, database: &str, collection: &str, key: &str) -> Result<Document, ArangoError> {
    ArangoClient::read_document(self, database, collection, key).await
  }

  async fn create_document(&self, database: &str, collection: &str, document: &Document) -> Result<(), ArangoError> {
    ArangoClient::create_document(self, database, collection, document).await
  }
}

/// Production backend: one fresh [`ArangoClient`] per `connect`.
#[derive(Debug, Clone)]
pub struct ArangoBackend {
  address: Address,
  endpoint: String,
  credentials: Credentials,
}

impl ArangoBackend {
  pub fn new(config: &DocumentConfig) -> Self {
    Self {
      address: config.address.clone(),
      endpoint: config.endpoint(),
      credentials: config.credentials.clone(),
    }
  }
}

impl DocumentBackend for ArangoBackend {
  type Client = ArangoClient;

  fn address(&self) -> &Address {
    &self.address
  }

  async fn connect(&self) -> Result<ArangoClient, ArangoError> {
    ArangoClient::new(&self.endpoint, self.credentials.clone())
  }
}
