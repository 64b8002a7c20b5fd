use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::Config;
use todo_api::http::{routes::todos, routing};
use todo_api::infrastructure::memory_repo::InMemoryTodoRepository;
use axum::body::to_bytes;
use axum::Router;
use serde_json::{json, Value};

fn app() -> Router {
    app_with(Config::default())
}

fn app_with(config: Config) -> Router {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    routing::app(todos::router(todos::AppState { service }), &config)
}

#[tokio::test]
async fn acceptance_create_list_get_update_delete() {
    let app = app();

    // create
    let res = request(&app, "POST", "/api/todos", Some(json!({ "title": "Test", "description": "First" }))).await;
    assert_eq!(res.status(), 201);
    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Todo created successfully");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    assert!(!id.is_empty());
    let created = body["data"].clone();

    // list
    let res = request(&app, "GET", "/api/todos", None).await;
    assert_eq!(res.status(), 200);
    let body = json_body(res).await;
    assert_eq!(body["count"], 1);

    // get
    let res = request(&app, "GET", &format!("/api/todos/{}", id), None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["data"], created);

    // update
    let res = request(&app, "PATCH", &format!("/api/todos/{}", id), Some(json!({ "is_complete": true }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["data"]["is_complete"], true);

    // delete
    let res = request(&app, "DELETE", &format!("/api/todos/{}", id), None).await;
    assert_eq!(res.status(), 200);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Todo deleted successfully");
    assert_eq!(body["data"]["id"], id.as_str());

    // get 404
    let res = request(&app, "GET", &format!("/api/todos/{}", id), None).await;
    assert_eq!(res.status(), 404);
    let body = json_body(res).await;
    assert_eq!(body, json!({ "success": false, "error": "Todo not found" }));
}

#[tokio::test]
async fn create_then_complete_then_stats() {
    let app = app();
    let res = request(&app, "POST", "/api/todos", Some(json!({ "title": "A", "description": "B" }))).await;
    assert_eq!(res.status(), 201);
    let created = json_body(res).await["data"].clone();
    assert_eq!(created["is_complete"], false);
    let due = chrono::DateTime::parse_from_rfc3339(created["due_date"].as_str().unwrap()).unwrap();
    assert!((chrono::Utc::now() - due.with_timezone(&chrono::Utc)).num_seconds().abs() < 5);

    let id = created["id"].as_str().unwrap();
    let res = request(&app, "PATCH", &format!("/api/todos/{id}"), Some(json!({ "is_complete": true }))).await;
    assert_eq!(res.status(), 200);
    let updated = json_body(res).await["data"].clone();
    assert_eq!(updated["is_complete"], true);
    for field in ["id", "title", "description", "due_date", "created_at"] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }
    assert_ne!(updated["updated_at"], created["updated_at"]);

    let res = request(&app, "GET", "/api/todos/stats/summary", None).await;
    assert_eq!(res.status(), 200);
    let stats = json_body(res).await["data"].clone();
    assert!(stats["completed"].as_u64().unwrap() >= 1);
    assert_eq!(stats["total"].as_u64().unwrap(), stats["completed"].as_u64().unwrap() + stats["pending"].as_u64().unwrap());
}

#[tokio::test]
async fn create_without_required_fields_is_rejected() {
    let app = app();
    for body in [
        json!({ "description": "no title" }),
        json!({ "title": "no description" }),
        json!({ "title": "   ", "description": "blank title" }),
        json!({ "title": null, "description": "null title" }),
    ] {
        let res = request(&app, "POST", "/api/todos", Some(body)).await;
        assert_eq!(res.status(), 400);
        let body = json_body(res).await;
        assert_eq!(body["error"], "Title and description are required");
    }
    let res = request(&app, "GET", "/api/todos", None).await;
    assert_eq!(json_body(res).await["count"], 0);
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let app = app();
    let res = raw_request(&app, "POST", "/api/todos", "{\"title\": 5}").await;
    assert_eq!(res.status(), 400);
    let res = raw_request(&app, "POST", "/api/todos", "not json").await;
    assert_eq!(res.status(), 400);
    assert_eq!(json_body(res).await["success"], false);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let app = app_with(Config { body_limit_bytes: 64, ..Config::default() });
    let body = json!({ "title": "x".repeat(200), "description": "y" });
    let res = request(&app, "POST", "/api/todos", Some(body)).await;
    assert_eq!(res.status(), 413);
}

#[tokio::test]
async fn patch_needs_at_least_one_field() {
    let app = app();
    let id = create(&app, "A", "B").await;
    let res = request(&app, "PATCH", &format!("/api/todos/{id}"), Some(json!({}))).await;
    assert_eq!(res.status(), 400);
    assert_eq!(json_body(res).await["error"], "At least one field is required for update");
}

#[tokio::test]
async fn patch_unknown_id_is_not_found() {
    let app = app();
    let res = request(&app, "PATCH", "/api/todos/does-not-exist", Some(json!({ "title": "x" }))).await;
    assert_eq!(res.status(), 404);
    let res = request(&app, "GET", "/api/todos", None).await;
    assert_eq!(json_body(res).await["count"], 0);
}

#[tokio::test]
async fn put_replaces_and_validates() {
    let app = app();
    let id = create(&app, "A", "B").await;

    let res = request(&app, "PUT", &format!("/api/todos/{id}"), Some(json!({ "title": "only title" }))).await;
    assert_eq!(res.status(), 400);
    let res = request(&app, "GET", &format!("/api/todos/{id}"), None).await;
    assert_eq!(json_body(res).await["data"]["title"], "A");

    let res = request(
        &app,
        "PUT",
        &format!("/api/todos/{id}"),
        Some(json!({ "title": " C ", "description": "D", "is_complete": true, "due_date": "2030-01-01T00:00:00Z" })),
    )
    .await;
    assert_eq!(res.status(), 200);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Todo replaced successfully");
    assert_eq!(body["data"]["id"], id.as_str());
    assert_eq!(body["data"]["title"], "C");
    assert_eq!(body["data"]["is_complete"], true);
    assert_eq!(body["data"]["due_date"], "2030-01-01T00:00:00Z");
}

#[tokio::test]
async fn delete_unknown_id_leaves_store_unchanged() {
    let app = app();
    create(&app, "A", "B").await;
    let res = request(&app, "DELETE", "/api/todos/unknown", None).await;
    assert_eq!(res.status(), 404);
    let res = request(&app, "GET", "/api/todos", None).await;
    assert_eq!(json_body(res).await["count"], 1);
}

#[tokio::test]
async fn list_filters_on_completed_and_sorts_by_due_date() {
    let app = app();
    for (title, done, due) in [
        ("old", false, "2020-01-01T00:00:00Z"),
        ("new", false, "2031-01-01T00:00:00Z"),
        ("finished", true, "2025-06-01T00:00:00Z"),
    ] {
        let body = json!({ "title": title, "description": "x", "is_complete": done, "due_date": due });
        assert_eq!(request(&app, "POST", "/api/todos", Some(body)).await.status(), 201);
    }

    let all = json_body(request(&app, "GET", "/api/todos", None).await).await;
    let titles: Vec<_> = all["data"].as_array().unwrap().iter().map(|t| t["title"].as_str().unwrap().to_string()).collect();
    assert_eq!(titles, ["new", "finished", "old"]);

    let done = json_body(request(&app, "GET", "/api/todos?completed=true", None).await).await;
    assert_eq!(done["count"], 1);
    assert!(done["data"].as_array().unwrap().iter().all(|t| t["is_complete"] == true));

    let pending = json_body(request(&app, "GET", "/api/todos?completed=false", None).await).await;
    assert_eq!(pending["count"], 2);
    assert!(pending["data"].as_array().unwrap().iter().all(|t| t["is_complete"] == false));

    let unfiltered = json_body(request(&app, "GET", "/api/todos?completed=maybe", None).await).await;
    assert_eq!(unfiltered["count"], 3);

    let stats = json_body(request(&app, "GET", "/api/todos/stats/summary", None).await).await;
    assert_eq!(stats["data"], json!({ "total": 3, "completed": 1, "pending": 2, "overdue": 1 }));
}

#[tokio::test]
async fn probes_and_metadata() {
    let app = app();
    let health = json_body(request(&app, "GET", "/health", None).await).await;
    assert_eq!(health["status"], "OK");
    assert!(health["uptime_seconds"].is_number());

    let ready = json_body(request(&app, "GET", "/ready", None).await).await;
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["table"], "Todos");

    let root = request(&app, "GET", "/", None).await;
    assert_eq!(root.status(), 200);
    assert_eq!(json_body(root).await["endpoints"]["todos"], "/api/todos");

    for path in ["/api", "/api/"] {
        let res = request(&app, "GET", path, None).await;
        assert_eq!(res.status(), 200);
        assert_eq!(json_body(res).await["message"], "Todo API is working!");
    }
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let app = app();
    let res = request(&app, "GET", "/api/nothing-here", None).await;
    assert_eq!(res.status(), 404);
    let body = json_body(res).await;
    assert_eq!(body["error"], "Route not found");
    assert_eq!(body["path"], "/api/nothing-here");
}

#[tokio::test]
async fn cors_allows_listed_and_pattern_origins_only() {
    let app = app();
    for (origin, allowed) in [
        ("http://localhost:3000", true),
        ("http://abc-123.us-west-2.elb.amazonaws.com:3000", true),
        ("https://attacker.example", false),
    ] {
        let res = preflight(&app, origin).await;
        let header = res.headers().get("access-control-allow-origin").map(|v| v.to_str().unwrap().to_string());
        if allowed {
            assert_eq!(header.as_deref(), Some(origin));
        } else {
            assert!(header.is_none(), "{origin} should be refused");
        }
    }
}

#[tokio::test]
async fn date_only_and_offsetless_due_dates_are_accepted() {
    let app = app();
    let res = request(&app, "POST", "/api/todos", Some(json!({ "title": "A", "description": "B", "due_date": "2026-11-01" }))).await;
    assert_eq!(res.status(), 201);
    let created = json_body(res).await["data"].clone();
    assert_eq!(created["due_date"], "2026-11-01T00:00:00Z");

    let id = created["id"].as_str().unwrap();
    let res = request(&app, "PATCH", &format!("/api/todos/{id}"), Some(json!({ "due_date": "2026-12-24" }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["data"]["due_date"], "2026-12-24T00:00:00Z");

    let res = request(&app, "PATCH", &format!("/api/todos/{id}"), Some(json!({ "due_date": "2026-11-01T09:30:00" }))).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["data"]["due_date"], "2026-11-01T09:30:00Z");

    let res = request(&app, "PATCH", &format!("/api/todos/{id}"), Some(json!({ "due_date": "someday" }))).await;
    assert_eq!(res.status(), 400);
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

fn panicking_app(config: Config) -> Router {
    let service = TodoServiceImpl::new(InMemoryTodoRepository::new());
    let router = todos::router(todos::AppState { service }).merge(Router::new().route("/api/explode", axum::routing::get(explode)));
    routing::app(router, &config)
}

#[tokio::test]
async fn handler_panic_is_a_500_and_server_keeps_serving() {
    let app = panicking_app(Config::default());
    let res = request(&app, "GET", "/api/explode", None).await;
    assert_eq!(res.status(), 500);
    assert_eq!(
        json_body(res).await,
        json!({ "success": false, "error": "Internal server error", "message": "Something went wrong" })
    );

    let res = request(&app, "GET", "/api/todos", None).await;
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["count"], 0);

    let dev = panicking_app(Config { app_env: todo_api::config::AppEnv::Development, ..Config::default() });
    let res = request(&dev, "GET", "/api/explode", None).await;
    assert_eq!(res.status(), 500);
    assert_eq!(json_body(res).await["message"], "handler exploded");
}

async fn create(app: &Router, title: &str, description: &str) -> String {
    let res = request(app, "POST", "/api/todos", Some(json!({ "title": title, "description": description }))).await;
    assert_eq!(res.status(), 201);
    json_body(res).await["data"]["id"].as_str().unwrap().to_string()
}

async fn json_body(res: hyper::Response<axum::body::Body>) -> Value {
    serde_json::from_slice(&to_bytes(res.into_body(), 1024 * 1024).await.unwrap()).unwrap()
}

async fn request(app: &Router, method: &str, path: &str, body: Option<serde_json::Value>) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder().method(Method::from_bytes(method.as_bytes()).unwrap()).uri(path);
    let req = match body {
        Some(json) => req.header("content-type", "application/json").body(Body::from(json.to_string())).unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(req).await.unwrap()
}

async fn raw_request(app: &Router, method: &str, path: &str, body: &'static str) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder()
        .method(Method::from_bytes(method.as_bytes()).unwrap())
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}

async fn preflight(app: &Router, origin: &str) -> hyper::Response<axum::body::Body> {
    use axum::body::Body;
    use axum::http::{Request, Method};
    use tower::ServiceExt;

    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/todos")
        .header("origin", origin)
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(req).await.unwrap()
}
