//! InferenceServer state and server lifecycle
//!
//! The server loads the engine completely before binding the socket; a
//! failed load aborts startup.

use std::sync::Arc;

use tracing::{info, warn};

use super::config::ServerConfig;
use super::routes::create_router;
use crate::engine::InferenceEngine;
use crate::error::{LiteCnnError, LiteCnnResult};
use crate::logging::init_logging_default;

/// Shared handler state
#[derive(Clone, Debug)]
pub struct InferenceServer {
    pub engine: Option<Arc<InferenceEngine>>,
}

impl InferenceServer {
    pub fn new(engine: Option<Arc<InferenceEngine>>) -> Self {
        InferenceServer { engine }
    }

    pub fn with_engine(engine: InferenceEngine) -> Self {
        Self::new(Some(Arc::new(engine)))
    }

    pub(crate) fn engine(&self) -> LiteCnnResult<&Arc<InferenceEngine>> {
        self.engine.as_ref().ok_or(LiteCnnError::EngineNotInitialized)
    }
}

/// Load the engine described by `config`
pub async fn load_engine(config: &ServerConfig) -> anyhow::Result<InferenceEngine> {
    config.validate()?;
    let weights = config.weights_path.clone().ok_or_else(|| {
        anyhow::anyhow!("no weight file configured; pass --weights or set LITECNN_WEIGHTS")
    })?;
    let labels = config.labels_path.clone();
    let engine_config = config.engine.clone();

    info!("Loading weights from {}", weights.display());
    let engine = tokio::task::spawn_blocking(move || {
        let engine = InferenceEngine::from_paths(&weights, labels.as_deref(), engine_config)?;
        if let Err(e) = engine.warm_up() {
            warn!("Warm-up failed: {}", e);
        }
        Ok::<_, LiteCnnError>(engine)
    })
    .await??;
    Ok(engine)
}

/// Load the engine, bind and serve until Ctrl-C
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    init_logging_default();

    let engine = load_engine(&config).await?;
    let server = InferenceServer::with_engine(engine);
    let app = create_router(server, config.max_body_bytes);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!("Starting LiteCNN server on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
