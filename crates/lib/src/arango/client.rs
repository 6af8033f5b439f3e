use std::time::Duration;

use reqwest::{Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{ArangoError, Document, ServerVersion};
use crate::config::Credentials;
use crate::consts::APP_NAME;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
  #[serde(default)]
  error_num: i64,
  #[serde(default)]
  error_message: String,
}

/// Authenticated client for one ArangoDB endpoint.
///
/// Every request carries HTTP basic auth. Non-2xx responses are decoded into
/// [`ArangoError`]; a 404 can be told apart with [`ArangoError::is_not_found`].
#[derive(Debug, Clone)]
pub struct ArangoClient {
  http: reqwest::Client,
  endpoint: Url,
  credentials: Credentials,
}

impl ArangoClient {
  pub fn new(endpoint: &str, credentials: Credentials) -> Result<Self, ArangoError> {
    let endpoint = Url::parse(endpoint).map_err(|e| ArangoError::InvalidEndpoint {
      endpoint: endpoint.to_string(),
      message: e.to_string(),
    })?;
    if endpoint.cannot_be_a_base() {
      return Err(ArangoError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        message: "not a base URL".to_string(),
      });
    }

    let http = reqwest::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .connect_timeout(CONNECT_TIMEOUT)
      .timeout(REQUEST_TIMEOUT)
      .build()?;

    Ok(Self {
      http,
      endpoint,
      credentials,
    })
  }

  pub async fn version(&self) -> Result<ServerVersion, ArangoError> {
    let response = self.send(Method::GET, &["_api", "version"], None).await?;
    response
      .json::<ServerVersion>()
      .await
      .map_err(|e| ArangoError::InvalidResponse(e.to_string()))
  }

  pub async fn database_exists(&self, name: &str) -> Result<bool, ArangoError> {
    exists(self.database(name).await)
  }

  pub async fn create_database(&self, name: &str) -> Result<(), ArangoError> {
    self
      .send(Method::POST, &["_api", "database"], Some(json!({ "name": name })))
      .await?;
    Ok(())
  }

  /// Open a database; fails with a not-found error if it is absent.
  pub async fn database(&self, name: &str) -> Result<(), ArangoError> {
    self
      .send(Method::GET, &["_db", name, "_api", "database", "current"], None)
      .await?;
    Ok(())
  }

  pub async fn collection_exists(&self, database: &str, name: &str) -> Result<bool, ArangoError> {
    exists(self.collection(database, name).await)
  }

  pub async fn create_collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    self
      .send(
        Method::POST,
        &["_db", database, "_api", "collection"],
        Some(json!({ "name": name })),
      )
      .await?;
    Ok(())
  }

  /// Open a collection; fails with a not-found error if it is absent.
  pub async fn collection(&self, database: &str, name: &str) -> Result<(), ArangoError> {
    self
      .send(Method::GET, &["_db", database, "_api", "collection", name], None)
      .await?;
    Ok(())
  }

  pub async fn read_document(&self, database: &str, collection: &str, key: &str) -> Result<Document, ArangoError> {
    let response = self
      .send(
        Method::GET,
        &["_db", database, "_api", "document", collection, key],
        None,
      )
      .await?;

    match response
      .json::<Value>()
      .await
      .map_err(|e| ArangoError::InvalidResponse(e.to_string()))?
    {
      Value::Object(document) => Ok(document),
      other => Err(ArangoError::InvalidResponse(format!(
        "expected a JSON object for document '{}', got {}",
        key, other
      ))),
    }
  }

  pub async fn create_document(&self, database: &str, collection: &str, document: &Document) -> Result<(), ArangoError> {
    self
      .send(
        Method::POST,
        &["_db", database, "_api", "document", collection],
        Some(Value::Object(document.clone())),
      )
      .await?;
    Ok(())
  }

  fn url(&self, segments: &[&str]) -> Result<Url, ArangoError> {
    let mut url = self.endpoint.clone();
    url
      .path_segments_mut()
      .map_err(|()| ArangoError::InvalidEndpoint {
        endpoint: self.endpoint.to_string(),
        message: "not a base URL".to_string(),
      })?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn send(&self, method: Method, segments: &[&str], body: Option<Value>) -> Result<Response, ArangoError> {
    let url = self.url(segments)?;
    debug!(%method, %url, "arangodb request");

    let mut request = self
      .http
      .request(method, url)
      .basic_auth(&self.credentials.username, Some(&self.credentials.password));
    if let Some(body) = body {
      request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    debug!(status = status.as_u16(), "arangodb response");

    if status.is_success() {
      Ok(response)
    } else {
      Err(error_from_response(status, response).await)
    }
  }
}

/// Map an "open" result onto an existence check.
fn exists(result: Result<(), ArangoError>) -> Result<bool, ArangoError> {
  match result {
    Ok(()) => Ok(true),
    Err(err) if err.is_not_found() => Ok(false),
    Err(err) => Err(err),
  }
}

async fn error_from_response(status: StatusCode, response: Response) -> ArangoError {
  let code = status.as_u16();
  if status == StatusCode::UNAUTHORIZED {
    return ArangoError::Unauthorized { code };
  }

  let text = response.text().await.unwrap_or_default();
  match serde_json::from_str::<ErrorBody>(&text) {
    Ok(body) if !body.error_message.is_empty() => ArangoError::Api {
      code,
      error_num: body.error_num,
      message: body.error_message,
    },
    _ => ArangoError::Api {
      code,
      error_num: 0,
      message: if text.is_empty() {
        status.canonical_reason().unwrap_or("unexpected status").to_string()
      } else {
        text
      },
    },
  }
}
