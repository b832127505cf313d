//! HTTP remote source for reconciliation pages.
//!
//! `GET {base}/tables/{table}/rows?user=&column=&since=&cursor=&limit=`
//! with an optional bearer token. The response body is a `RemotePage`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use stride_core::errors::RemoteError;
use stride_core::models::{PageRequest, RemotePage};
use stride_core::traits::RemoteSource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpRemoteConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub bearer_token: Option<String>,
}

impl Default for HttpRemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_secs: 30,
            bearer_token: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpRemoteSource {
    base_url: Url,
    client: reqwest::Client,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl HttpRemoteSource {
    pub fn new(config: HttpRemoteConfig) -> Result<Self, RemoteError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| RemoteError::Malformed {
            reason: format!("invalid base url '{}': {e}", config.base_url),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::Malformed {
                reason: format!("base url '{}' cannot carry a path", config.base_url),
            });
        }
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| RemoteError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url,
            client,
            bearer_token: config.bearer_token,
            timeout,
        })
    }

    pub fn set_bearer_token(&mut self, token: impl Into<String>) {
        self.bearer_token = Some(token.into());
    }

    pub fn clear_bearer_token(&mut self) {
        self.bearer_token = None;
    }

    /// The table name is one percent-encoded path segment.
    fn rows_url(&self, table: &str) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteError::Malformed {
                reason: format!("base url '{}' cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(["tables", table, "rows"]);
        Ok(url)
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<RemotePage, RemoteError> {
        let mut query: Vec<(&str, String)> = vec![
            ("user", request.user_id.clone()),
            ("column", request.recency_column.clone()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(since) = request.since {
            query.push(("since", since.to_rfc3339()));
        }
        if let Some(cursor) = &request.cursor {
            query.push(("cursor", cursor.clone()));
        }

        let mut builder = self.client.get(self.rows_url(&request.table)?).query(&query);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout {
                    after_ms: self.timeout.as_millis() as u64,
                }
            } else {
                RemoteError::network(format!("GET {} failed: {e}", request.table))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<RemotePage>()
                .await
                .map_err(|e| RemoteError::Malformed {
                    reason: format!("invalid page for {}: {e}", request.table),
                });
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = serde_json::from_slice::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| String::from_utf8_lossy(&body).to_string());
        tracing::warn!(table = %request.table, %status, message = %message, "remote page request failed");

        Err(classify(status, &message))
    }
}

/// Throttling and server errors may clear up on retry; anything else is a
/// refusal.
fn classify(status: StatusCode, message: &str) -> RemoteError {
    let reason = format!("{status}: {message}");
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        RemoteError::Network { reason }
    } else {
        RemoteError::Rejected { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PageRequest {
        PageRequest {
            user_id: "alice".to_string(),
            table: "sessions".to_string(),
            recency_column: "updated_at".to_string(),
            since: None,
            cursor: None,
            limit: 100,
        }
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let source = HttpRemoteSource::new(HttpRemoteConfig {
            base_url: "https://api.example.test/v1/".to_string(),
            ..HttpRemoteConfig::default()
        })
        .unwrap();
        assert_eq!(
            source.rows_url("sessions").unwrap().as_str(),
            "https://api.example.test/v1/tables/sessions/rows"
        );
    }

    #[test]
    fn table_name_is_encoded_as_a_single_segment() {
        let source = HttpRemoteSource::new(HttpRemoteConfig {
            base_url: "https://api.example.test".to_string(),
            ..HttpRemoteConfig::default()
        })
        .unwrap();
        let url = source.rows_url("body weight/log?x#y").unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/tables/body%20weight%2Flog%3Fx%23y/rows"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn unparseable_base_url_is_refused() {
        let err = HttpRemoteSource::new(HttpRemoteConfig {
            base_url: "not a url".to_string(),
            ..HttpRemoteConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, RemoteError::Malformed { .. }));
    }

    #[test]
    fn throttling_and_server_errors_are_retryable() {
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "slow down").is_retryable());
        assert!(classify(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(classify(StatusCode::SERVICE_UNAVAILABLE, "").is_retryable());
    }

    #[test]
    fn client_errors_are_rejections() {
        let err = classify(StatusCode::UNAUTHORIZED, "token expired");
        assert_eq!(
            err,
            RemoteError::Rejected {
                reason: "401 Unauthorized: token expired".to_string()
            }
        );
        assert!(!classify(StatusCode::NOT_FOUND, "").is_retryable());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let source = HttpRemoteSource::new(HttpRemoteConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 5,
            bearer_token: None,
        })
        .unwrap();
        let err = source.fetch_page(&request()).await.unwrap_err();
        assert!(err.is_retryable(), "got {err:?}");
    }
}
