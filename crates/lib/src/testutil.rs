//! Test doubles for the three store backends.
//!
//! Each fake keeps its state behind `Rc<RefCell<..>>` so a test can inspect
//! what the code under test wrote while the fake is still borrowed by it.
//! Fakes are pointed at a live [`Listener`] so the reachability probe passes,
//! or at [`closed_address`] so it fails.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use tokio::net::TcpListener;

use crate::arango::{
  ArangoError, Document, ERROR_COLLECTION_NOT_FOUND, ERROR_DATABASE_NOT_FOUND, ERROR_DOCUMENT_NOT_FOUND,
  ServerVersion,
};
use crate::cache::{CacheBackend, CacheConnection, CacheError};
use crate::config::Address;
use crate::document::{DocumentBackend, DocumentClient};
use crate::relational::{RelationalBackend, RelationalError, RelationalSession};

/// A bound TCP listener that never accepts; connects land in its backlog.
pub struct Listener {
  _inner: TcpListener,
  address: Address,
}

impl Listener {
  pub async fn bind() -> Self {
    let inner = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = inner.local_addr().unwrap().port();
    Self {
      _inner: inner,
      address: Address::new("127.0.0.1", port),
    }
  }

  pub fn address(&self) -> Address {
    self.address.clone()
  }
}

/// An address nothing is listening on.
pub async fn closed_address() -> Address {
  Listener::bind().await.address()
}

// =============================================================================
// Document store
// =============================================================================

type Collections = HashMap<String, HashMap<String, Document>>;

#[derive(Default)]
struct DocumentState {
  databases: HashMap<String, Collections>,
  calls: usize,
  writes: usize,
  version_calls: usize,
  connect_failures: u32,
  version_failures: u32,
  read_failure: Option<ArangoError>,
  unauthorized: bool,
}

#[derive(Clone)]
pub struct FakeDocumentStore {
  address: Address,
  state: Rc<RefCell<DocumentState>>,
}

impl FakeDocumentStore {
  pub fn new(address: Address) -> Self {
    Self {
      address,
      state: Rc::default(),
    }
  }

  pub fn create_database(&self, name: &str) {
    self.state.borrow_mut().databases.entry(name.to_string()).or_default();
  }

  pub fn create_collection(&self, database: &str, name: &str) {
    self
      .state
      .borrow_mut()
      .databases
      .entry(database.to_string())
      .or_default()
      .entry(name.to_string())
      .or_default();
  }

  /// Store `fields` under `key`, creating the database and collection if needed.
  pub fn insert(&self, database: &str, collection: &str, key: &str, fields: Value) {
    let mut document = match fields {
      Value::Object(map) => map,
      other => panic!("document fields must be an object, got {}", other),
    };
    document.insert("_key".to_string(), Value::String(key.to_string()));
    self
      .state
      .borrow_mut()
      .databases
      .entry(database.to_string())
      .or_default()
      .entry(collection.to_string())
      .or_default()
      .insert(key.to_string(), document);
  }

  pub fn document(&self, database: &str, collection: &str, key: &str) -> Option<Document> {
    let state = self.state.borrow();
    state.databases.get(database)?.get(collection)?.get(key).cloned()
  }

  /// Operations issued so far, connects included.
  pub fn calls(&self) -> usize {
    self.state.borrow().calls
  }

  /// Creations of databases, collections and documents.
  pub fn writes(&self) -> usize {
    self.state.borrow().writes
  }

  pub fn version_calls(&self) -> usize {
    self.state.borrow().version_calls
  }

  pub fn fail_next_connects(&self, count: u32) {
    self.state.borrow_mut().connect_failures = count;
  }

  pub fn fail_next_versions(&self, count: u32) {
    self.state.borrow_mut().version_failures = count;
  }

  /// The next document read fails with `err`.
  pub fn fail_reads_with(&self, err: ArangoError) {
    self.state.borrow_mut().read_failure = Some(err);
  }

  pub fn reject_credentials(&self) {
    self.state.borrow_mut().unauthorized = true;
  }
}

impl DocumentBackend for FakeDocumentStore {
  type Client = FakeDocumentClient;

  fn address(&self) -> &Address {
    &self.address
  }

  async fn connect(&self) -> Result<FakeDocumentClient, ArangoError> {
    let mut state = self.state.borrow_mut();
    state.calls += 1;
    if state.connect_failures > 0 {
      state.connect_failures -= 1;
      return Err(unavailable("connection refused"));
    }
    Ok(FakeDocumentClient {
      state: Rc::clone(&self.state),
    })
  }
}

pub struct FakeDocumentClient {
  state: Rc<RefCell<DocumentState>>,
}

impl FakeDocumentClient {
  fn call<T>(&self, op: impl FnOnce(&mut DocumentState) -> Result<T, ArangoError>) -> Result<T, ArangoError> {
    let mut state = self.state.borrow_mut();
    state.calls += 1;
    if state.unauthorized {
      return Err(ArangoError::Unauthorized { code: 401 });
    }
    op(&mut *state)
  }
}

fn unavailable(message: &str) -> ArangoError {
  ArangoError::Api {
    code: 503,
    error_num: 503,
    message: message.to_string(),
  }
}

fn conflict(error_num: i64, message: &str) -> ArangoError {
  ArangoError::Api {
    code: 409,
    error_num,
    message: message.to_string(),
  }
}

fn collections<'a>(state: &'a mut DocumentState, database: &str) -> Result<&'a mut Collections, ArangoError> {
  state
    .databases
    .get_mut(database)
    .ok_or_else(|| ArangoError::not_found(ERROR_DATABASE_NOT_FOUND, "database not found"))
}

fn documents<'a>(
  state: &'a mut DocumentState,
  database: &str,
  collection: &str,
) -> Result<&'a mut HashMap<String, Document>, ArangoError> {
  collections(state, database)?
    .get_mut(collection)
    .ok_or_else(|| ArangoError::not_found(ERROR_COLLECTION_NOT_FOUND, "collection or view not found"))
}

impl DocumentClient for FakeDocumentClient {
  async fn version(&self) -> Result<ServerVersion, ArangoError> {
    self.call(|state| {
      state.version_calls += 1;
      if state.version_failures > 0 {
        state.version_failures -= 1;
        return Err(unavailable("service unavailable"));
      }
      Ok(ServerVersion {
        server: "arango".to_string(),
        version: "3.11.4".to_string(),
        license: Some("community".to_string()),
      })
    })
  }

  async fn database_exists(&self, name: &str) -> Result<bool, ArangoError> {
    self.call(|state| Ok(state.databases.contains_key(name)))
  }

  async fn create_database(&self, name: &str) -> Result<(), ArangoError> {
    self.call(|state| {
      if state.databases.contains_key(name) {
        return Err(conflict(1207, "duplicate database name"));
      }
      state.writes += 1;
      state.databases.insert(name.to_string(), Collections::new());
      Ok(())
    })
  }

  async fn open_database(&self, name: &str) -> Result<(), ArangoError> {
    self.call(|state| collections(state, name).map(|_| ()))
  }

  async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, ArangoError> {
    self.call(|state| Ok(collections(state, database)?.contains_key(name)))
  }

  async fn create_collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    self.call(|state| {
      let collections = collections(state, database)?;
      if collections.contains_key(name) {
        return Err(conflict(1207, "duplicate name"));
      }
      collections.insert(name.to_string(), HashMap::new());
      state.writes += 1;
      Ok(())
    })
  }

  async fn open_collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    self.call(|state| documents(state, database, name).map(|_| ()))
  }

  async fn read_document(&self, database: &str, collection: &str, key: &str) -> Result<Document, ArangoError> {
    self.call(|state| {
      if let Some(err) = state.read_failure.take() {
        return Err(err);
      }
      documents(state, database, collection)?
        .get(key)
        .cloned()
        .ok_or_else(|| ArangoError::not_found(ERROR_DOCUMENT_NOT_FOUND, "document not found"))
    })
  }

  async fn create_document(&self, database: &str, collection: &str, document: &Document) -> Result<(), ArangoError> {
    self.call(|state| {
      let key = match document.get("_key") {
        Some(Value::String(key)) => key.clone(),
        _ => return Err(ArangoError::InvalidResponse("document without _key".to_string())),
      };
      let documents = documents(state, database, collection)?;
      if documents.contains_key(&key) {
        return Err(conflict(1210, "unique constraint violated"));
      }
      documents.insert(key, document.clone());
      state.writes += 1;
      Ok(())
    })
  }
}

// =============================================================================
// Relational store
// =============================================================================

/// database -> table -> `name` column of every row
type Tables = HashMap<String, Vec<String>>;

struct RelationalState {
  databases: HashMap<String, Tables>,
  connected: Vec<String>,
  open_sessions: usize,
  database_failure: Option<sqlx::Error>,
  table_failure: Option<sqlx::Error>,
  lookup_failure: Option<sqlx::Error>,
  count_failure: Option<sqlx::Error>,
  /// Pings that succeed before the held error is returned.
  ping_failure: Option<(usize, sqlx::Error)>,
  ping_delay: Duration,
}

#[derive(Clone)]
pub struct FakeRelationalStore {
  address: Address,
  state: Rc<RefCell<RelationalState>>,
}

impl FakeRelationalStore {
  /// A server holding only the `postgres` admin database.
  pub fn new(address: Address) -> Self {
    let mut databases = HashMap::new();
    databases.insert("postgres".to_string(), Tables::new());
    Self {
      address,
      state: Rc::new(RefCell::new(RelationalState {
        databases,
        connected: Vec::new(),
        open_sessions: 0,
        database_failure: None,
        table_failure: None,
        lookup_failure: None,
        count_failure: None,
        ping_failure: None,
        ping_delay: Duration::ZERO,
      })),
    }
  }

  pub fn create_database(&self, name: &str) {
    self.state.borrow_mut().databases.entry(name.to_string()).or_default();
  }

  pub fn seed(&self, database: &str, table: &str, names: &[&str]) {
    self
      .state
      .borrow_mut()
      .databases
      .entry(database.to_string())
      .or_default()
      .entry(table.to_string())
      .or_default()
      .extend(names.iter().map(|name| name.to_string()));
  }

  pub fn has_table(&self, database: &str, table: &str) -> bool {
    let state = self.state.borrow();
    state.databases.get(database).is_some_and(|tables| tables.contains_key(table))
  }

  pub fn rows(&self, database: &str, table: &str, name: &str) -> usize {
    let state = self.state.borrow();
    state
      .databases
      .get(database)
      .and_then(|tables| tables.get(table))
      .map_or(0, |rows| rows.iter().filter(|row| *row == name).count())
  }

  /// Databases successfully connected to, in order.
  pub fn connected_databases(&self) -> Vec<String> {
    self.state.borrow().connected.clone()
  }

  pub fn open_sessions(&self) -> usize {
    self.state.borrow().open_sessions
  }

  pub fn fail_database_creation(&self, err: sqlx::Error) {
    self.state.borrow_mut().database_failure = Some(err);
  }

  pub fn fail_table_creation(&self, err: sqlx::Error) {
    self.state.borrow_mut().table_failure = Some(err);
  }

  pub fn fail_table_lookup(&self, err: sqlx::Error) {
    self.state.borrow_mut().lookup_failure = Some(err);
  }

  pub fn fail_row_count(&self, err: sqlx::Error) {
    self.state.borrow_mut().count_failure = Some(err);
  }

  /// Let `successes` pings through, then fail the next one with `err`.
  pub fn fail_ping_after(&self, successes: usize, err: sqlx::Error) {
    self.state.borrow_mut().ping_failure = Some((successes, err));
  }

  pub fn set_ping_delay(&self, delay: Duration) {
    self.state.borrow_mut().ping_delay = delay;
  }
}

impl RelationalBackend for FakeRelationalStore {
  type Session = FakeSession;

  fn address(&self) -> &Address {
    &self.address
  }

  async fn connect(&self, database: &str) -> Result<FakeSession, RelationalError> {
    let mut state = self.state.borrow_mut();
    if !state.databases.contains_key(database) {
      return Err(
        sqlx::Error::Protocol(format!("database \"{}\" does not exist", database)).into(),
      );
    }
    state.connected.push(database.to_string());
    state.open_sessions += 1;
    Ok(FakeSession {
      state: Rc::clone(&self.state),
      database: database.to_string(),
    })
  }
}

pub struct FakeSession {
  state: Rc<RefCell<RelationalState>>,
  database: String,
}

fn missing_relation(table: &str) -> RelationalError {
  sqlx::Error::Protocol(format!("relation \"{}\" does not exist", table)).into()
}

impl FakeSession {
  fn with_tables<T>(&self, op: impl FnOnce(&mut Tables) -> Result<T, RelationalError>) -> Result<T, RelationalError> {
    let mut state = self.state.borrow_mut();
    let tables = state
      .databases
      .get_mut(&self.database)
      .ok_or_else(|| RelationalError::from(sqlx::Error::Protocol("database dropped".to_string())))?;
    op(tables)
  }
}

impl RelationalSession for FakeSession {
  async fn create_database(&mut self, name: &str) -> Result<(), RelationalError> {
    let mut state = self.state.borrow_mut();
    if let Some(err) = state.database_failure.take() {
      return Err(err.into());
    }
    if state.databases.contains_key(name) {
      return Err(RelationalError::DuplicateDatabase { name: name.to_string() });
    }
    state.databases.insert(name.to_string(), Tables::new());
    Ok(())
  }

  async fn create_table(&mut self, table: &str) -> Result<(), RelationalError> {
    if let Some(err) = self.state.borrow_mut().table_failure.take() {
      return Err(err.into());
    }
    self.with_tables(|tables| {
      tables.entry(table.to_string()).or_default();
      Ok(())
    })
  }

  async fn insert_row(&mut self, table: &str, name: &str) -> Result<u64, RelationalError> {
    self.with_tables(|tables| {
      let rows = tables.get_mut(table).ok_or_else(|| missing_relation(table))?;
      if rows.iter().any(|row| row == name) {
        return Ok(0);
      }
      rows.push(name.to_string());
      Ok(1)
    })
  }

  async fn ping(&mut self) -> Result<(), RelationalError> {
    let delay = {
      let mut state = self.state.borrow_mut();
      match state.ping_failure.take() {
        Some((0, err)) => return Err(err.into()),
        Some((successes, err)) => state.ping_failure = Some((successes - 1, err)),
        None => {}
      }
      state.ping_delay
    };
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    Ok(())
  }

  async fn table_exists(&mut self, table: &str) -> Result<bool, RelationalError> {
    if let Some(err) = self.state.borrow_mut().lookup_failure.take() {
      return Err(err.into());
    }
    self.with_tables(|tables| Ok(tables.contains_key(table)))
  }

  async fn count_rows(&mut self, table: &str, name: &str) -> Result<i64, RelationalError> {
    if let Some(err) = self.state.borrow_mut().count_failure.take() {
      return Err(err.into());
    }
    self.with_tables(|tables| {
      let rows = tables.get(table).ok_or_else(|| missing_relation(table))?;
      Ok(rows.iter().filter(|row| *row == name).count() as i64)
    })
  }

  async fn close(self) -> Result<(), RelationalError> {
    self.state.borrow_mut().open_sessions -= 1;
    Ok(())
  }
}

// =============================================================================
// Cache
// =============================================================================

type ErrorFactory = Box<dyn Fn() -> CacheError>;

#[derive(Default)]
struct CacheState {
  entries: HashMap<String, String>,
  connections: usize,
  set_failure: Option<ErrorFactory>,
  get_failure: Option<ErrorFactory>,
  ping_fails: bool,
  ping_delay: Duration,
}

#[derive(Clone)]
pub struct FakeCache {
  address: Address,
  state: Rc<RefCell<CacheState>>,
}

impl FakeCache {
  pub fn new(address: Address) -> Self {
    Self {
      address,
      state: Rc::default(),
    }
  }

  pub fn put(&self, key: &str, value: &str) {
    self.state.borrow_mut().entries.insert(key.to_string(), value.to_string());
  }

  pub fn value(&self, key: &str) -> Option<String> {
    self.state.borrow().entries.get(key).cloned()
  }

  pub fn len(&self) -> usize {
    self.state.borrow().entries.len()
  }

  pub fn connections(&self) -> usize {
    self.state.borrow().connections
  }

  pub fn fail_sets_with(&self, factory: impl Fn() -> CacheError + 'static) {
    self.state.borrow_mut().set_failure = Some(Box::new(factory));
  }

  pub fn fail_gets_with(&self, factory: impl Fn() -> CacheError + 'static) {
    self.state.borrow_mut().get_failure = Some(Box::new(factory));
  }

  pub fn fail_pings(&self) {
    self.state.borrow_mut().ping_fails = true;
  }

  pub fn set_ping_delay(&self, delay: Duration) {
    self.state.borrow_mut().ping_delay = delay;
  }
}

impl CacheBackend for FakeCache {
  type Connection = FakeCacheConnection;

  fn address(&self) -> &Address {
    &self.address
  }

  async fn connect(&self) -> Result<FakeCacheConnection, CacheError> {
    self.state.borrow_mut().connections += 1;
    Ok(FakeCacheConnection {
      state: Rc::clone(&self.state),
    })
  }
}

pub struct FakeCacheConnection {
  state: Rc<RefCell<CacheState>>,
}

impl CacheConnection for FakeCacheConnection {
  async fn ping(&mut self) -> Result<String, CacheError> {
    let (fails, delay) = {
      let state = self.state.borrow();
      (state.ping_fails, state.ping_delay)
    };
    if fails {
      return Err(CacheError::Timeout {
        operation: "PING".to_string(),
        after: Duration::from_secs(5),
      });
    }
    if !delay.is_zero() {
      tokio::time::sleep(delay).await;
    }
    Ok("PONG".to_string())
  }

  async fn get(&mut self, key: &str) -> Result<Option<String>, CacheError> {
    let state = self.state.borrow();
    if let Some(factory) = &state.get_failure {
      return Err(factory());
    }
    Ok(state.entries.get(key).cloned())
  }

  async fn set(&mut self, key: &str, value: &str) -> Result<(), CacheError> {
    let mut state = self.state.borrow_mut();
    if let Some(factory) = &state.set_failure {
      return Err(factory());
    }
    state.entries.insert(key.to_string(), value.to_string());
    Ok(())
  }
}
