use std::net::SocketAddr;
use std::sync::Arc;

use assay_core::{AssignmentLedger, ServerConfig};
use tokio::net::TcpListener;
use tokio::signal;

use crate::dispatcher::build_router;

pub struct AssayServer {
    addr: SocketAddr,
    ledger: Arc<AssignmentLedger>,
}

impl AssayServer {
    pub fn new(addr: SocketAddr, ledger: Arc<AssignmentLedger>) -> Self {
        Self { addr, ledger }
    }

    pub fn from_config(
        config: &ServerConfig,
        ledger: Arc<AssignmentLedger>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::new(config.socket_addr()?, ledger))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds and serves until SIGINT/SIGTERM, then drains in-flight requests.
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener).await
    }

    /// Serves on an already-bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let local = listener.local_addr()?;
        tracing::info!("Assay server listening on http://{}", local);

        let app = build_router(self.ledger);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Assay server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
