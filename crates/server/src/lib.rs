//! HTTP API for stray-dog field report triage.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness, accelerator and embedding backend status
//! - `GET /ready` - Readiness; 503 until warm-up has finished
//! - `GET /metrics` - Prometheus metrics
//! - `POST /api/nlp/analyze-report` - Category, sentiment, urgency, summary, entities
//! - `POST /api/nlp/pipeline` - Analysis plus embedding and top categories
//! - `POST /api/nlp/embed` - Embedding vector only
//! - `POST /api/nlp/find-duplicates` - Similar earlier reports
//!
//! Errors are returned as `{"error": {"code": ..., "message": ...}}`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, spawn_warm_up, start_server};
pub use state::ServerState;
