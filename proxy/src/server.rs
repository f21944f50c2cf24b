//! Axum-based proxy server.

use axum::{
    routing::{get, post},
    Router,
};
use ballot_gateway::ContractGateway;
use ballot_utils::ShutdownController;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::error::ProxyError;
use crate::handlers;
use crate::metrics::ProxyMetrics;

/// Shared handler state.
#[derive(Clone)]
pub struct ProxyState {
    pub gateway: Arc<dyn ContractGateway>,
    pub metrics: Option<Arc<ProxyMetrics>>,
}

impl ProxyState {
    pub fn new(gateway: Arc<dyn ContractGateway>) -> Self {
        Self {
            gateway,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ProxyMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Build the proxy's routes with permissive CORS.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/candidates", get(handlers::candidates))
        .route("/api/vote", post(handlers::vote))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct ProxyServer {
    pub port: u16,
    pub state: ProxyState,
}

impl ProxyServer {
    pub fn new(port: u16, state: ProxyState) -> Self {
        Self { port, state }
    }

    /// Bind `0.0.0.0:port` and serve until `shutdown` fires.
    pub async fn start(self, shutdown: broadcast::Receiver<()>) -> Result<(), ProxyError> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ProxyError::Bind { addr, source })?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ProxyError> {
        let local = listener.local_addr()?;
        info!(
            addr = %local,
            contract = %self.state.gateway.contract_address(),
            metrics = self.state.metrics.is_some(),
            "proxy listening"
        );

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(async move {
                ShutdownController::wait(shutdown).await;
                info!("proxy shutting down");
            })
            .await?;
        Ok(())
    }
}
