use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::todo_service::TodoError;

/// Success envelope shared by every `/api/todos` route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, message: None, count: None, data } }

    pub fn with_message(data: T, message: &str) -> Self {
        Self { message: Some(message.to_string()), ..Self::ok(data) }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self { Self { count: Some(data.len()), ..Self::ok(data) } }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound,
    /// The request body could not be read or parsed.
    Body { status: StatusCode, message: String },
    /// Store failure; `context` names the operation, `message` is passed through.
    Store { context: &'static str, message: String },
}

impl ApiError {
    /// Maps a service failure, labelling store errors with the operation that failed.
    pub fn from_service(err: TodoError, context: &'static str) -> Self {
        match err {
            TodoError::Validation(msg) => Self::Validation(msg.to_string()),
            TodoError::NotFound(_) => Self::NotFound,
            TodoError::Store(e) => Self::Store { context, message: format!("{e:#}") },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::Body { status, message: rejection.body_text() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Self::NotFound => (StatusCode::NOT_FOUND, "Todo not found".to_string(), None),
            Self::Body { status, message } => (status, "Invalid request body".to_string(), Some(message)),
            Self::Store { context, message } => {
                tracing::error!(error = %message, "{context}");
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string(), Some(message))
            }
        };
        (status, Json(ErrorBody { success: false, error, message })).into_response()
    }
}
