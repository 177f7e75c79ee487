use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::token::TokenStore;
use crate::error::ApiError;
use crate::storage::ApiConfig;

/// A session as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    #[serde(rename = "_id")]
    pub id: String,
    pub date: DateTime<Utc>,
    /// Seconds.
    pub duration: u64,
}

/// One row of the backend's weekly aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDailySummary {
    /// Day key as the backend groups it.
    #[serde(rename = "_id")]
    pub date: String,
    #[serde(rename = "totalDuration")]
    pub total_duration: u64,
    pub count: u64,
}

/// HTTP client that attaches the stored bearer token to every request.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, ApiError> {
        url::Url::parse(base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn from_config(config: &ApiConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            tokens,
        )
    }

    /// Record a finished session's length with the backend.
    pub async fn save_session(&self, duration_secs: u64) -> Result<(), ApiError> {
        let req = self
            .request(Method::POST, "/meditation/save-session")
            .await?
            .json(&json!({ "duration": duration_secs }));
        self.send(req).await?;
        debug!(duration_secs, "session saved remotely");
        Ok(())
    }

    pub async fn history(&self) -> Result<Vec<RemoteSession>, ApiError> {
        let req = self.request(Method::GET, "/meditation/history").await?;
        Ok(self.send(req).await?.json().await?)
    }

    pub async fn weekly_summary(&self) -> Result<Vec<RemoteDailySummary>, ApiError> {
        let req = self.request(Method::GET, "/meditation/weekly").await?;
        Ok(self.send(req).await?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut req = self.http.request(method, self.url(path));
        // An empty stored token counts as no token.
        if let Some(token) = self.token().await?.filter(|t| !t.is_empty()) {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    /// Token stores may block (the OS keyring goes over D-Bus), so the
    /// lookup runs on the blocking pool.
    async fn token(&self) -> Result<Option<String>, ApiError> {
        let tokens = Arc::clone(&self.tokens);
        tokio::task::spawn_blocking(move || tokens.get())
            .await
            .map_err(|e| ApiError::TokenStore(e.to_string()))?
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "backend rejected request");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryTokenStore;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, tokens: MemoryTokenStore) -> ApiClient {
        let base = format!("{}/api", server.url());
        ApiClient::new(&base, Duration::from_secs(5), Arc::new(tokens)).unwrap()
    }

    #[tokio::test]
    async fn save_session_posts_duration_with_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/meditation/save-session")
            .match_header("authorization", "Bearer secret-token")
            .match_body(Matcher::Json(json!({ "duration": 300 })))
            .with_status(201)
            .with_body(r#"{"message":"saved"}"#)
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::with_token("secret-token"));
        client.save_session(300).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/meditation/history")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::default());
        assert!(client.history().await.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_token_is_not_sent() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/meditation/weekly")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::with_token(""));
        client.weekly_summary().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn history_decodes_backend_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/meditation/history")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"_id":"65a1","date":"2026-03-10T07:30:00.000Z","duration":600,"user":"u1"}]"#,
            )
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::with_token("t"));
        let history = client.history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, "65a1");
        assert_eq!(history[0].duration, 600);
    }

    #[tokio::test]
    async fn weekly_summary_decodes_backend_shape() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/meditation/weekly")
            .with_status(200)
            .with_body(r#"[{"_id":"2026-03-10","totalDuration":900,"count":2}]"#)
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::default());
        let summary = client.weekly_summary().await.unwrap();
        assert_eq!(
            summary,
            vec![RemoteDailySummary {
                date: "2026-03-10".into(),
                total_duration: 900,
                count: 2
            }]
        );
    }

    /// Hands out a token only once the gate is opened.
    struct GatedTokenStore {
        gate: std::sync::Mutex<std::sync::mpsc::Receiver<()>>,
    }

    impl TokenStore for GatedTokenStore {
        fn get(&self) -> Result<Option<String>, ApiError> {
            self.gate
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .map_err(|e| ApiError::TokenStore(e.to_string()))?;
            Ok(Some("gated".into()))
        }

        fn set(&self, _token: &str) -> Result<(), ApiError> {
            Ok(())
        }

        fn clear(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_token_store_does_not_stall_the_runtime() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/meditation/history")
            .match_header("authorization", "Bearer gated")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let (open, gate) = std::sync::mpsc::channel();
        let store = GatedTokenStore {
            gate: std::sync::Mutex::new(gate),
        };
        let base = format!("{}/api", server.url());
        let client = ApiClient::new(&base, Duration::from_secs(5), Arc::new(store)).unwrap();

        // On a single-threaded runtime the gate only opens if the token
        // lookup yields instead of blocking.
        let (history, ()) = tokio::join!(client.history(), async move {
            tokio::task::yield_now().await;
            open.send(()).unwrap();
        });
        assert!(history.unwrap().is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/meditation/save-session")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = client_for(&server, MemoryTokenStore::with_token("expired"));
        match client.save_session(60).await {
            Err(ApiError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("Expected Status error, got {other:?}"),
        }
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ApiClient::new(
            "not a url",
            Duration::from_secs(1),
            Arc::new(MemoryTokenStore::default()),
        );
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let client = ApiClient::new(
            "http://localhost:5000/api/",
            Duration::from_secs(1),
            Arc::new(MemoryTokenStore::default()),
        )
        .unwrap();
        assert_eq!(
            client.url("/meditation/history"),
            "http://localhost:5000/api/meditation/history"
        );
    }
}
