//! HTTP server for the LiteCNN classifier
//!
//! - **types**: HTTP error mapping and request/response structures
//! - **config**: listen address, model paths and limits
//! - **routes**: router setup
//! - **handlers**: request handlers
//! - **server**: shared state and server lifecycle

pub mod config;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod types;

pub use config::ServerConfig;
pub use routes::create_router;
pub use server::{load_engine, run_server, InferenceServer};
pub use types::{ErrorBody, HttpError, PredictQuery};
