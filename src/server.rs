//! Service wiring — registry, repository, worker pool and HTTP server.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::task_routes;
use crate::config::ServiceConfig;
use crate::error::{RegistryError, Result};
use crate::handlers::HandlerRegistry;
use crate::handlers::builtin::register_builtin;
use crate::tasks::{InMemoryTaskRepository, TaskService};
use crate::worker::WorkerPool;

/// Build the handler registry. A duplicate name here aborts startup.
pub fn build_registry(config: &ServiceConfig) -> std::result::Result<HandlerRegistry, RegistryError> {
    let mut registry = HandlerRegistry::new();
    register_builtin(&mut registry, config.slow_handler_delay)?;
    Ok(registry)
}

/// Run the service until Ctrl-C or until `cancel` fires.
pub async fn run(config: ServiceConfig, cancel: CancellationToken) -> Result<()> {
    config.validate()?;
    let registry = Arc::new(build_registry(&config)?);
    info!(handlers = ?registry.names(), "Handlers registered");

    let repo = InMemoryTaskRepository::new();
    let pool = WorkerPool::spawn(&config.worker_config(), repo.clone(), cancel.clone());

    let app = task_routes(TaskService::new(repo, registry));
    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Task API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;

    pool.shutdown().await;
    info!("Service stopped");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown signal received");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();
}
