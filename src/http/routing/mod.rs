pub mod cors;

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Response, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::Config;
use cors::OriginPolicy;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
struct ProbeState {
    started: Instant,
    table: String,
}

/// Wraps the resource routes with probes, metadata, the 404 fallback and the
/// middleware stack (tracing, CORS, panic isolation, body limit).
pub fn app(router: Router, config: &Config) -> Router {
    let probes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(ProbeState { started: Instant::now(), table: config.table_name.clone() });

    Router::new()
        .route("/", get(root))
        .route("/api", get(api_index))
        .route("/api/", get(api_index))
        .merge(probes)
        .merge(router)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(OriginPolicy::from_config(config).layer())
                .layer(CatchPanicLayer::custom(PanicResponse { expose_details: config.is_development() }))
                .layer(DefaultBodyLimit::max(config.body_limit_bytes)),
        )
}

async fn health(State(probe): State<ProbeState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "timestamp": Utc::now(),
        "uptime_seconds": probe.started.elapsed().as_secs_f64(),
    }))
}

/// The table is provisioned before the listener binds, so a live process is ready.
async fn ready(State(probe): State<ProbeState>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "table": probe.table,
        "timestamp": Utc::now(),
        "uptime_seconds": probe.started.elapsed().as_secs_f64(),
    }))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "todo-api",
        "version": VERSION,
        "message": "Todo API is running",
        "endpoints": { "api": "/api", "todos": "/api/todos", "health": "/health", "ready": "/ready" },
    }))
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "message": "Todo API is working!",
        "version": VERSION,
        "endpoints": {
            "todos": "/api/todos",
            "stats": "/api/todos/stats/summary",
            "health": "/health",
        },
    }))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "success": false, "error": "Route not found", "path": uri.path() })))
}

/// Turns a handler panic into a 500; the panic text is only shown in development.
#[derive(Clone, Copy)]
pub struct PanicResponse {
    pub expose_details: bool,
}

impl ResponseForPanic for PanicResponse {
    type ResponseBody = Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response<Self::ResponseBody> {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            s.to_string()
        } else {
            "unknown panic".to_string()
        };
        tracing::error!(panic = %detail, "request handler panicked");
        let message = if self.expose_details { detail } else { "Something went wrong".to_string() };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "error": "Internal server error", "message": message })),
        )
            .into_response()
    }
}
