use anyhow::Context;
use todo_api::application::todo_service::TodoServiceImpl;
use todo_api::config::{Config, StoreBackend};
use todo_api::domain::repository::{TableAdmin, TodoRepository};
use todo_api::http::{routes::todos, routing};
use todo_api::infrastructure::{dynamo_repo::{self, DynamoTodoRepository}, memory_repo::InMemoryTodoRepository, provisioning};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    match config.store_backend {
        StoreBackend::Dynamodb => {
            let client = dynamo_repo::connect(&config).await;
            serve(DynamoTodoRepository::new(client, config.table_name.clone()), config).await
        }
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store; data is lost on exit");
            serve(InMemoryTodoRepository::new(), config).await
        }
    }
}

async fn serve<R: TodoRepository + TableAdmin + Clone>(repo: R, config: Config) -> anyhow::Result<()> {
    tracing::info!(table = repo.table_name(), "initializing store");
    provisioning::provision(&repo, config.poll_policy())
        .await
        .context("failed to initialize the todo table; server not started")?;

    let service = TodoServiceImpl::new(repo);
    let router = routing::app(todos::router(todos::AppState { service }), &config);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => { signal.recv().await; }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown");
}
