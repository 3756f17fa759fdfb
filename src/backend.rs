use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    #[error("could not reach backend: {0}")]
    Transport(String),
    #[error("malformed backend response: {0}")]
    Decode(String),
    #[error("backend returned HTTP {status}")]
    Api { status: u16, error: Option<String> },
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    /// JSON-encoded arguments, exactly as the agent produced them.
    pub arguments: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ToolCall>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ToolCall>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default)]
    pub processing_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub mcp_client_initialized: bool,
    #[serde(default)]
    #[allow(dead_code)]
    pub status: Option<String>,
    #[serde(default)]
    pub tools_count: Option<u64>,
    #[serde(default)]
    #[allow(dead_code)]
    pub initialization_complete: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// The agent server the chat talks to.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError>;
    async fn reset(&self) -> Result<(), BackendError>;
    async fn status(&self) -> Result<StatusResponse, BackendError>;
}

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpBackend {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn query(&self, query: &str) -> Result<QueryResponse, BackendError> {
        tracing::debug!(url = %self.url("/api/query"), "sending query");

        let response = self
            .client
            .post(self.url("/api/query"))
            .json(&QueryRequest { query })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error_body: ErrorBody = decode(&body)?;
            return Err(BackendError::Api {
                status: status.as_u16(),
                error: error_body.error,
            });
        }

        let parsed: QueryResponse = decode(&body)?;
        if let Some(ref took) = parsed.processing_time {
            tracing::info!(tool_calls = parsed.tool_calls.len(), "query processed in {}s", took);
        }
        Ok(parsed)
    }

    async fn reset(&self) -> Result<(), BackendError> {
        tracing::debug!(url = %self.url("/api/reset"), "resetting conversation");

        let response = self.client.post(self.url("/api/reset")).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Api {
                status: status.as_u16(),
                error: None,
            })
        }
    }

    async fn status(&self) -> Result<StatusResponse, BackendError> {
        tracing::debug!(url = %self.url("/api/status"), "checking server status");

        let response = self.client.get(self.url("/api/status")).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(BackendError::Api {
                status: status.as_u16(),
                error: None,
            });
        }

        let body = response.bytes().await?;
        decode(&body)
    }
}
