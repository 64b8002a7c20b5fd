//! HTTP client for the todo API, used by the `todo-tui` binary.

pub mod view;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::domain::todo::{CreateTodo, Todo, TodoId, TodoStats};
use crate::http::types::{ApiResponse, ErrorBody};

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("server returned {status}")]
    Server { status: StatusCode, body: Option<ErrorBody> },
    /// No usable response (connection refused, timeout, DNS).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    /// A success response whose body did not match the envelope.
    #[error("unexpected response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl ClientError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { status, body } => body
                .as_ref()
                .and_then(|b| b.message.clone().or_else(|| Some(b.error.clone()).filter(|e| !e.is_empty())))
                .unwrap_or_else(|| format!("Server error: {}", status.as_u16())),
            Self::Network(_) => "Network error - cannot reach server".to_string(),
            Self::Decode(e) => e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` points at the API prefix, e.g. `http://localhost:3001/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http: reqwest::Client::new(), base_url }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("TODO_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()))
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    pub async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>> {
        let mut request = self.http.get(format!("{}/todos", self.base_url));
        if let Some(flag) = completed {
            request = request.query(&[("completed", flag.to_string())]);
        }
        decode(request.send().await.map_err(ClientError::Network)?).await
    }

    pub async fn create(&self, input: &CreateTodo) -> Result<Todo> {
        let response = self
            .http
            .post(format!("{}/todos", self.base_url))
            .json(input)
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(response).await
    }

    /// Marks a todo as done. There is no way back to pending from the client.
    pub async fn complete(&self, id: &TodoId) -> Result<Todo> {
        let response = self
            .http
            .patch(format!("{}/todos/{}", self.base_url, id))
            .json(&json!({ "is_complete": true }))
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(response).await
    }

    pub async fn stats(&self) -> Result<TodoStats> {
        let response = self
            .http
            .get(format!("{}/todos/stats/summary", self.base_url))
            .send()
            .await
            .map_err(ClientError::Network)?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.json::<ErrorBody>().await.ok();
        return Err(ClientError::Server { status, body });
    }
    let envelope: ApiResponse<T> = response.json().await.map_err(ClientError::Decode)?;
    Ok(envelope.data)
}
