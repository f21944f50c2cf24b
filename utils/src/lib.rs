//! Shared utilities for the ballot client.

pub mod logging;
pub mod shutdown;

pub use logging::{init_logging, LogFormat};
pub use shutdown::ShutdownController;
