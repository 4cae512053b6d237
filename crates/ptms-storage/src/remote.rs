//! HTTP backend talking to the Project-TMS file server via `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::collection::validate_name;
use crate::errors::{Result, StorageError};
use crate::gateway::PersistenceGateway;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client of the `/api/files` endpoints.
pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct FileList {
    files: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Connection failures and timeouts mean "try the cache"; everything the
/// transport reports is treated that way.
fn transport_error(e: &reqwest::Error) -> StorageError {
    StorageError::Unavailable(e.to_string())
}

impl RemoteStore {
    /// Client for `base_url` (e.g. `http://localhost:3000/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ptms/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Base API URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn file_url(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        Ok(format!("{}/files/{name}.json", self.base_url))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(StorageError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    async fn json_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status().as_u16();
        response.json().await.map_err(|e| StorageError::Remote {
            status,
            message: format!("invalid response body: {e}"),
        })
    }
}

#[async_trait]
impl PersistenceGateway for RemoteStore {
    async fn read_collection(&self, name: &str) -> Result<Value> {
        let url = self.file_url(name)?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let value = Self::json_body(Self::check(response).await?).await?;
        debug!(collection = name, "read remote collection");
        Ok(value)
    }

    async fn write_collection(&self, name: &str, value: &Value) -> Result<()> {
        let url = self.file_url(name)?;
        let response = self
            .client
            .post(&url)
            .json(value)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let _ = Self::check(response).await?;
        debug!(collection = name, "wrote remote collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<bool> {
        let url = self.file_url(name)?;
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = Self::json_body(Self::check(response).await?).await?;
        // The server answers success either way; only its message differs.
        let existed = body
            .get("message")
            .and_then(Value::as_str)
            .is_none_or(|m| !m.contains("already doesn't exist"));
        Ok(existed)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(format!("{}/files", self.base_url))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;
        let body = Self::json_body(Self::check(response).await?).await?;
        let list: FileList = serde_json::from_value(body)?;
        let mut names: Vec<String> = list
            .files
            .into_iter()
            .filter_map(|f| f.strip_suffix(".json").map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Collection;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(server: &MockServer) -> RemoteStore {
        RemoteStore::new(format!("{}/api/", server.uri()), DEFAULT_TIMEOUT)
    }

    #[tokio::test]
    async fn reads_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files/tasks.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "task-1"}])))
            .mount(&server)
            .await;

        let store = remote(&server);
        assert!(store.base_url().ends_with("/api"));
        let tasks = store.read(Collection::Tasks).await.unwrap();
        assert_eq!(tasks, json!([{"id": "task-1"}]));
    }

    #[tokio::test]
    async fn writes_collection_as_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/files/projects.json"))
            .and(body_json(json!([{"id": "proj-1"}])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "File projects.json saved successfully"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = remote(&server);
        store
            .write(Collection::Projects, &json!([{"id": "proj-1"}]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_status_maps_to_remote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "disk full"})))
            .mount(&server)
            .await;

        let store = remote(&server);
        let err = store.read(Collection::Tasks).await.unwrap_err();
        assert_matches!(&err, StorageError::Remote { status: 500, message } if message == "disk full");
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let server = MockServer::start().await;
        let url = format!("{}/api", server.uri());
        drop(server);

        let store = RemoteStore::new(url, Duration::from_millis(500));
        let err = store.read(Collection::Tasks).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn slow_server_times_out_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let store = RemoteStore::new(format!("{}/api", server.uri()), Duration::from_millis(100));
        assert!(store.read(Collection::Tasks).await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn lists_json_stems() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "files": ["tasks.json", "readme.txt", "projects.json"]
            })))
            .mount(&server)
            .await;

        let store = remote(&server);
        assert_eq!(
            store.list_collections().await.unwrap(),
            vec!["projects", "tasks"]
        );
    }

    #[tokio::test]
    async fn delete_reports_missing() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/files/settings.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "message": "File settings.json already doesn't exist"
            })))
            .mount(&server)
            .await;

        let store = remote(&server);
        assert!(!store.delete_collection("settings").await.unwrap());
    }
}
