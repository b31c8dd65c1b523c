use crate::server::routes::{self, AppState};
use anyhow::Context;
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// A bound but not yet serving dashboard HTTP server.
pub struct DashboardServer {
    listener: TcpListener,
    app: Router,
}

impl DashboardServer {
    /// Bind `address:port`. Port 0 picks a free port.
    pub async fn bind(address: &str, port: u16, state: AppState) -> anyhow::Result<Self> {
        let listener = TcpListener::bind((address, port))
            .await
            .with_context(|| format!("failed to bind {}:{}", address, port))?;

        Ok(Self {
            listener,
            app: routes::build_router(state),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until `shutdown` resolves, then drain in-flight ones.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        log::info!("Dashboard listening on http://{}", addr);

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server error")?;

        log::info!("Dashboard server shut down");
        Ok(())
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
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

    log::info!("Shutdown signal received");
}
