use std::sync::Arc;

use tcpserver::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "127.0.0.1:8080";

// ---------------------------------------------------------------------------
// Server bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let address = std::env::var("TCPSERVER_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let server = Arc::new(Config::new().address(address).build());

    let mut serving = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.serve().await }
    });

    let finished = tokio::select! {
        joined = &mut serving => Some(joined),
        () = shutdown_signal() => {
            tracing::info!("shutting down");
            None
        }
    };

    // Serve may have stopped on its own; shutdown still runs exactly once
    // so any in-flight connection finishes before exit.
    server.shutdown().await;
    let joined = match finished {
        Some(joined) => joined,
        None => serving.await,
    };

    match joined? {
        Ok(()) => {
            tracing::info!("shutdown complete");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %err, "server error");
            Err(err.into())
        }
    }
}

/// Waits for Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
