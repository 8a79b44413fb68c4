//! Challenge Judge - Application Entry Point
//!
//! This is the main entry point for the judging server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use challenge_judge::{
    config::{SandboxBackend, CONFIG},
    db, handlers,
    judge::{DockerSandbox, Notifier, Pipeline, ProcessSandbox, Sandbox},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| CONFIG.server.rust_log.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting challenge judge...");

    let store = db::open_store(&CONFIG.database).await?;

    let notifier = Notifier::connect(CONFIG.redis.url.as_deref()).await?;

    let sandbox: Arc<dyn Sandbox> = match CONFIG.sandbox.backend {
        SandboxBackend::Docker => {
            tracing::info!("Connecting to Docker...");
            Arc::new(DockerSandbox::connect(CONFIG.sandbox.clone()).await?)
        }
        SandboxBackend::Process => {
            tracing::warn!("Using process sandbox; submitted code runs on this host");
            Arc::new(ProcessSandbox::new(CONFIG.sandbox.clone()))
        }
    };

    let pipeline = Pipeline::new(store, sandbox, notifier, CONFIG.judge.clone());
    pipeline.recover().await?;

    let shutdown = CancellationToken::new();
    let workers = pipeline.spawn_workers(&shutdown);
    let watchdog = pipeline.spawn_watchdog(&shutdown);
    tracing::info!(workers = workers.len(), "Judge workers running");

    // Create application state and router
    let state = AppState::new(pipeline, CONFIG.jwt.clone());
    let app = handlers::app(state);

    // Start the server
    let addr = SocketAddr::new(CONFIG.server.host.parse()?, CONFIG.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    tracing::info!("Waiting for judge workers to stop...");
    shutdown.cancel();
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(error = %e, "Judge worker panicked");
        }
    }
    if let Err(e) = watchdog.await {
        tracing::error!(error = %e, "Watchdog panicked");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM and cancels the worker pool
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
