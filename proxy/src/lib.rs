//! HTTP proxy for the voting contract.
//!
//! Provides endpoints for:
//! - Candidate listing (`GET /api/candidates`)
//! - Vote submission on behalf of a voter address (`POST /api/vote`)
//! - Prometheus metrics (`GET /metrics`, when enabled)
//!
//! The proxy is stateless: every request is answered from fresh contract
//! reads.

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;

pub use error::ProxyError;
pub use metrics::ProxyMetrics;
pub use server::{router, ProxyServer, ProxyState};
