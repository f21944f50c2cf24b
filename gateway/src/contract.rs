//! The contract surface the client consumes.

use async_trait::async_trait;
use ballot_types::{Address, Candidate};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Outcome of a mined write transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

/// Read and write access to the deployed voting contract.
///
/// Implementations perform no validation of election rules; the contract
/// enforces them and reports violations as errors. Every write is issued on
/// behalf of `from` and resolves once the transaction is mined.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// Address the gateway is bound to.
    fn contract_address(&self) -> Address;

    // ── Reads ───────────────────────────────────────────────────────────

    async fn admin(&self) -> Result<Address, GatewayError>;

    async fn election_open(&self) -> Result<bool, GatewayError>;

    async fn candidates_count(&self) -> Result<u64, GatewayError>;

    /// `candidates(id)`; ids are dense and start at 1.
    async fn candidate(&self, id: u64) -> Result<Candidate, GatewayError>;

    /// `voters(address)`: whether the identity has voted in this epoch.
    async fn has_voted(&self, voter: &Address) -> Result<bool, GatewayError>;

    /// `authorizedVoters(address)`.
    async fn is_authorized(&self, voter: &Address) -> Result<bool, GatewayError>;

    // ── Writes ──────────────────────────────────────────────────────────

    async fn vote(&self, from: &Address, candidate_id: u64) -> Result<TxReceipt, GatewayError>;

    async fn add_voter(&self, from: &Address, voter: &Address) -> Result<TxReceipt, GatewayError>;

    async fn add_candidate(&self, from: &Address, name: &str) -> Result<TxReceipt, GatewayError>;

    async fn toggle_election(&self, from: &Address) -> Result<TxReceipt, GatewayError>;

    async fn reset_election(&self, from: &Address) -> Result<TxReceipt, GatewayError>;
}
