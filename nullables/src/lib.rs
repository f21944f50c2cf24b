//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (the deployed contract and the wallet provider)
//! are abstracted behind traits in `ballot-gateway`. This crate provides
//! test-friendly implementations that:
//! - Apply the same rules the deployed contract enforces
//! - Can be controlled programmatically (failures, paused reads, account switches)
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod gateway;
pub mod provider;

pub use gateway::{NullGateway, RecordedWrite};
pub use provider::NullProvider;
