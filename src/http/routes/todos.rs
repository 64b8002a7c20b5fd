use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Deserialize;

use crate::application::todo_service::TodoService;
use crate::domain::todo::{CreateTodo, ReplaceTodo, Todo, TodoId, TodoStats, UpdateTodo};
use crate::http::types::{ApiError, ApiResponse};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/api/todos/stats/summary", get(todo_stats::<S>))
        .route(
            "/api/todos/:id",
            get(get_todo::<S>).patch(update_todo::<S>).put(replace_todo::<S>).delete(delete_todo::<S>),
        )
        .with_state(state)
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams { pub completed: Option<String> }

impl ListParams {
    /// Only the literal strings `true` and `false` filter; anything else lists everything.
    fn completed_filter(&self) -> Option<bool> {
        match self.completed.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>, Query(params): Query<ListParams>) -> ApiResult<Vec<Todo>> {
    let todos = state
        .service
        .list(params.completed_filter())
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch todos"))?;
    Ok(Json(ApiResponse::list(todos)))
}

async fn get_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Todo> {
    let todo = state
        .service
        .get(TodoId(id))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch todo"))?;
    Ok(Json(ApiResponse::ok(todo)))
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Todo>>), ApiError> {
    let Json(payload) = payload?;
    let todo = state
        .service
        .create(payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to create todo"))?;
    Ok((StatusCode::CREATED, Json(ApiResponse::with_message(todo, "Todo created successfully"))))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> ApiResult<Todo> {
    let Json(payload) = payload?;
    let todo = state
        .service
        .update(TodoId(id), payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to update todo"))?;
    Ok(Json(ApiResponse::with_message(todo, "Todo updated successfully")))
}

async fn replace_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<ReplaceTodo>, JsonRejection>,
) -> ApiResult<Todo> {
    let Json(payload) = payload?;
    let todo = state
        .service
        .replace(TodoId(id), payload)
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to replace todo"))?;
    Ok(Json(ApiResponse::with_message(todo, "Todo replaced successfully")))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> ApiResult<Todo> {
    let todo = state
        .service
        .delete(TodoId(id))
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to delete todo"))?;
    Ok(Json(ApiResponse::with_message(todo, "Todo deleted successfully")))
}

async fn todo_stats<S: TodoService>(State(state): State<AppState<S>>) -> ApiResult<TodoStats> {
    let stats = state
        .service
        .stats()
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to fetch statistics"))?;
    Ok(Json(ApiResponse::ok(stats)))
}
