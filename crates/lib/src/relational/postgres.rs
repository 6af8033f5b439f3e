use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{Connection, Executor};
use tracing::debug;

use super::{RelationalBackend, RelationalError, RelationalSession};
use crate::config::{Address, RelationalConfig, SslMode};

/// SQLSTATE `duplicate_database`.
const DUPLICATE_DATABASE: &str = "42P04";

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
  format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Decide whether a failed `CREATE DATABASE` means the database is already there.
///
/// The SQLSTATE is authoritative when the server sent one; the message text is
/// only consulted when it did not.
pub(crate) fn is_duplicate_database(code: Option<&str>, message: &str, name: &str) -> bool {
  match code {
    Some(code) => code == DUPLICATE_DATABASE,
    None => message == format!("database \"{}\" already exists", name),
  }
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
  match mode {
    SslMode::Disable => PgSslMode::Disable,
    SslMode::Prefer => PgSslMode::Prefer,
    SslMode::Require => PgSslMode::Require,
  }
}

/// Production backend: one dedicated `PgConnection` per session.
#[derive(Debug, Clone)]
pub struct PostgresBackend {
  config: RelationalConfig,
}

impl PostgresBackend {
  pub fn new(config: &RelationalConfig) -> Self {
    Self { config: config.clone() }
  }

  pub fn connect_options(&self, database: &str) -> PgConnectOptions {
    let config = &self.config;
    PgConnectOptions::new()
      .host(&config.address.host)
      .port(config.address.port)
      .username(&config.credentials.username)
      .password(&config.credentials.password)
      .database(database)
      .ssl_mode(pg_ssl_mode(config.ssl_mode))
  }
}

impl RelationalBackend for PostgresBackend {
  type Session = PostgresSession;

  fn address(&self) -> &Address {
    &self.config.address
  }

  async fn connect(&self, database: &str) -> Result<PostgresSession, RelationalError> {
    debug!(address = %self.config.address, database, "connecting to PostgreSQL");
    let conn = PgConnection::connect_with(&self.connect_options(database)).await?;
    Ok(PostgresSession { conn })
  }
}

pub struct PostgresSession {
  conn: PgConnection,
}

impl RelationalSession for PostgresSession {
  async fn create_database(&mut self, name: &str) -> Result<(), RelationalError> {
    // CREATE DATABASE cannot be prepared; send it as a simple query.
    let sql = format!("CREATE DATABASE {}", quote_ident(name));
    match (&mut self.conn).execute(sql.as_str()).await {
      Ok(_) => Ok(()),
      Err(err) => {
        let duplicate = err
          .as_database_error()
          .is_some_and(|db| is_duplicate_database(db.code().as_deref(), db.message(), name));
        if duplicate {
          Err(RelationalError::DuplicateDatabase { name: name.to_string() })
        } else {
          Err(err.into())
        }
      }
    }
  }

  async fn create_table(&mut self, table: &str) -> Result<(), RelationalError> {
    let sql = format!(
      "CREATE TABLE IF NOT EXISTS {} (id SERIAL PRIMARY KEY, name TEXT NOT NULL)",
      quote_ident(table)
    );
    (&mut self.conn).execute(sql.as_str()).await?;
    Ok(())
  }

  async fn insert_row(&mut self, table: &str, name: &str) -> Result<u64, RelationalError> {
    let table = quote_ident(table);
    let sql = format!(
      "INSERT INTO {table} (name) SELECT $1 WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE name = $1) ON CONFLICT DO NOTHING"
    );
    let result = sqlx::query(&sql).bind(name).execute(&mut self.conn).await?;
    Ok(result.rows_affected())
  }

  async fn ping(&mut self) -> Result<(), RelationalError> {
    self.conn.ping().await?;
    Ok(())
  }

  async fn table_exists(&mut self, table: &str) -> Result<bool, RelationalError> {
    let exists = sqlx::query_scalar::<_, bool>(
      "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table)
    .fetch_one(&mut self.conn)
    .await?;
    Ok(exists)
  }

  async fn count_rows(&mut self, table: &str, name: &str) -> Result<i64, RelationalError> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE name = $1", quote_ident(table));
    let count = sqlx::query_scalar::<_, i64>(&sql)
      .bind(name)
      .fetch_one(&mut self.conn)
      .await?;
    Ok(count)
  }

  async fn close(self) -> Result<(), RelationalError> {
    self.conn.close().await?;
    Ok(())
  }
}
