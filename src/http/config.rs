//! Server configuration
//!
//! Values come from `LITECNN_*` environment variables; the CLI overrides
//! them field by field.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::engine::EngineConfig;
use crate::error::{LiteCnnError, LiteCnnResult};

pub const ADDR_ENV: &str = "LITECNN_ADDR";
pub const WEIGHTS_ENV: &str = "LITECNN_WEIGHTS";
pub const LABELS_ENV: &str = "LITECNN_LABELS";
pub const TOP_K_ENV: &str = "LITECNN_TOP_K";
pub const MAX_BODY_ENV: &str = "LITECNN_MAX_BODY_BYTES";
pub const MODEL_NAME_ENV: &str = "LITECNN_MODEL_NAME";
pub const WARMUP_ENV: &str = "LITECNN_WARMUP_ITERATIONS";

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Default upload limit for `POST /predict`
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Configuration for the HTTP server
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub weights_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            weights_path: None,
            labels_path: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by whichever `LITECNN_*` variables are set
    pub fn from_env() -> LiteCnnResult<Self> {
        let mut config = Self::default();
        if let Some(addr) = env_var(ADDR_ENV) {
            config.addr = parse_addr(&addr)?;
        }
        if let Some(path) = env_var(WEIGHTS_ENV) {
            config.weights_path = Some(PathBuf::from(path));
        }
        if let Some(path) = env_var(LABELS_ENV) {
            config.labels_path = Some(PathBuf::from(path));
        }
        if let Some(k) = env_var(TOP_K_ENV) {
            config.engine.top_k = parse_usize(TOP_K_ENV, &k)?;
        }
        if let Some(n) = env_var(MAX_BODY_ENV) {
            config.max_body_bytes = parse_usize(MAX_BODY_ENV, &n)?;
        }
        if let Some(name) = env_var(MODEL_NAME_ENV) {
            config.engine.model_name = name.trim().to_string();
        }
        if let Some(n) = env_var(WARMUP_ENV) {
            config.engine.warmup_iterations = parse_usize(WARMUP_ENV, &n)?;
        }
        Ok(config)
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_weights_path(mut self, path: PathBuf) -> Self {
        self.weights_path = Some(path);
        self
    }

    pub fn with_labels_path(mut self, path: PathBuf) -> Self {
        self.labels_path = Some(path);
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn validate(&self) -> LiteCnnResult<()> {
        if self.max_body_bytes == 0 {
            return Err(LiteCnnError::InvalidConfiguration(
                "max_body_bytes must be > 0".to_string(),
            ));
        }
        self.engine.validate()
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

pub fn parse_addr(value: &str) -> LiteCnnResult<SocketAddr> {
    value.trim().parse().map_err(|e| {
        LiteCnnError::InvalidConfiguration(format!("invalid listen address '{}': {}", value, e))
    })
}

fn parse_usize(key: &str, value: &str) -> LiteCnnResult<usize> {
    value.trim().parse().map_err(|_| {
        LiteCnnError::InvalidConfiguration(format!("{} must be a non-negative integer, got '{}'", key, value))
    })
}
