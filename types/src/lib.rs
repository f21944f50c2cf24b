//! Fundamental types for the ballot client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, chain identifiers, election phases, candidates, voter status,
//! epochs and roles. None of them carry contract logic; they describe what the
//! deployed contract reports.

pub mod address;
pub mod candidate;
pub mod error;
pub mod network;
pub mod state;

pub use address::Address;
pub use candidate::Candidate;
pub use error::TypesError;
pub use network::{ChainId, NetworkId};
pub use state::{ElectionPhase, Epoch, Role, VoterStatus};
