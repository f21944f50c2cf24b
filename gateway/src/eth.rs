//! [`ContractGateway`] over Ethereum JSON-RPC.
//!
//! Reads are `eth_call`s against the latest block. Writes are
//! `eth_sendTransaction`s signed by the node or wallet behind the endpoint,
//! followed by receipt polling so that a returned [`TxReceipt`] always refers
//! to a mined transaction.

use async_trait::async_trait;
use ballot_types::{Address, Candidate};
use ethers_core::abi::{Detokenize, Tokenize};
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Bytes, TransactionReceipt, TransactionRequest, TxHash, H160, U256, U64};
use ethers_providers::Middleware;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::abi::{self, ContractMethod};
use crate::contract::{ContractGateway, TxReceipt};
use crate::error::{AbiError, GatewayError, RpcError};
use crate::rpc::RpcClient;

/// Gas budget attached to every write.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// How long to wait for a transaction to be mined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Gateway bound to one deployed contract address.
#[derive(Clone)]
pub struct RpcGateway {
    rpc: RpcClient,
    contract: Address,
    gas_limit: u64,
    receipts: ReceiptPolicy,
}

impl RpcGateway {
    pub fn new(rpc: RpcClient, contract: Address) -> Self {
        Self {
            rpc,
            contract,
            gas_limit: DEFAULT_GAS_LIMIT,
            receipts: ReceiptPolicy::default(),
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_receipt_policy(mut self, receipts: ReceiptPolicy) -> Self {
        self.receipts = receipts;
        self
    }

    fn eth_address(address: &Address) -> Result<H160, GatewayError> {
        abi::to_eth_address(address).map_err(|e| GatewayError::InvalidArgument(e.to_string()))
    }

    fn call_data<T: Tokenize>(method: ContractMethod, args: T) -> Result<Bytes, GatewayError> {
        method
            .encode(args)
            .map_err(|e| GatewayError::InvalidArgument(format!("{}(): {e}", method.name())))
    }

    fn decode_error(method: ContractMethod, e: AbiError) -> GatewayError {
        GatewayError::Decode {
            method: method.name(),
            message: e.to_string(),
        }
    }

    fn write_error(method: ContractMethod, e: impl Into<RpcError>) -> GatewayError {
        GatewayError::Write {
            method: method.name(),
            message: e.into().message(),
        }
    }

    /// `eth_call` against the latest block, returning the raw return data.
    async fn call_raw<T: Tokenize>(
        &self,
        method: ContractMethod,
        args: T,
    ) -> Result<Bytes, GatewayError> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(Self::eth_address(&self.contract)?)
            .data(Self::call_data(method, args)?)
            .into();

        self.rpc
            .provider()
            .call(&tx, None)
            .await
            .map_err(|e| GatewayError::Read {
                method: method.name(),
                message: RpcError::from(e).message(),
            })
    }

    async fn call<D: Detokenize, T: Tokenize>(
        &self,
        method: ContractMethod,
        args: T,
    ) -> Result<D, GatewayError> {
        let raw = self.call_raw(method, args).await?;
        method.decode(&raw).map_err(|e| Self::decode_error(method, e))
    }

    /// `eth_sendTransaction` followed by receipt polling.
    ///
    /// The request carries only `from`, `to`, `gas` and `data`; fees and
    /// nonce are left to the signing wallet.
    async fn send<T: Tokenize>(
        &self,
        method: ContractMethod,
        from: &Address,
        args: T,
    ) -> Result<TxReceipt, GatewayError> {
        if !from.is_hex_account() {
            return Err(GatewayError::InvalidArgument(format!(
                "sender {from} is not a hex account address"
            )));
        }

        let request = TransactionRequest::new()
            .from(Self::eth_address(from)?)
            .to(Self::eth_address(&self.contract)?)
            .gas(self.gas_limit)
            .data(Self::call_data(method, args)?);

        let tx_hash: TxHash = self
            .rpc
            .call("eth_sendTransaction", [&request])
            .await
            .map_err(|e| Self::write_error(method, e))?;

        info!(method = method.name(), %from, tx_hash = %format!("{tx_hash:#x}"), "transaction submitted");
        self.wait_for_receipt(method, tx_hash).await
    }

    async fn wait_for_receipt(
        &self,
        method: ContractMethod,
        tx_hash: TxHash,
    ) -> Result<TxReceipt, GatewayError> {
        let deadline = Instant::now() + self.receipts.timeout;

        loop {
            let receipt = self
                .rpc
                .provider()
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(|e| Self::write_error(method, e))?;

            if let Some(receipt) = receipt {
                return settle(method, receipt);
            }

            if Instant::now() >= deadline {
                return Err(GatewayError::Write {
                    method: method.name(),
                    message: format!(
                        "transaction {tx_hash:#x} not mined within {}s",
                        self.receipts.timeout.as_secs()
                    ),
                });
            }
            sleep(self.receipts.poll_interval).await;
        }
    }
}

/// Turn a mined receipt into the caller's result; status `0` is a revert.
fn settle(method: ContractMethod, receipt: TransactionReceipt) -> Result<TxReceipt, GatewayError> {
    let tx_hash = format!("{:#x}", receipt.transaction_hash);
    if receipt.status == Some(U64::zero()) {
        warn!(method = method.name(), %tx_hash, "transaction reverted");
        return Err(GatewayError::Reverted {
            method: method.name(),
            tx_hash,
        });
    }
    let block_number = receipt.block_number.map(|n| n.as_u64());
    debug!(method = method.name(), %tx_hash, ?block_number, "transaction mined");
    Ok(TxReceipt {
        transaction_hash: tx_hash,
        block_number,
    })
}

#[async_trait]
impl ContractGateway for RpcGateway {
    fn contract_address(&self) -> Address {
        self.contract.clone()
    }

    async fn admin(&self) -> Result<Address, GatewayError> {
        let admin: H160 = self.call(ContractMethod::Admin, ()).await?;
        Ok(abi::from_eth_address(admin))
    }

    async fn election_open(&self) -> Result<bool, GatewayError> {
        self.call(ContractMethod::ElectionOpen, ()).await
    }

    async fn candidates_count(&self) -> Result<u64, GatewayError> {
        let method = ContractMethod::CandidatesCount;
        let count: U256 = self.call(method, ()).await?;
        abi::to_u64(count).map_err(|e| Self::decode_error(method, e))
    }

    async fn candidate(&self, id: u64) -> Result<Candidate, GatewayError> {
        let method = ContractMethod::Candidates;
        let raw = self.call_raw(method, U256::from(id)).await?;
        abi::decode_candidate(&raw).map_err(|e| Self::decode_error(method, e))
    }

    async fn has_voted(&self, voter: &Address) -> Result<bool, GatewayError> {
        self.call(ContractMethod::Voters, Self::eth_address(voter)?)
            .await
    }

    async fn is_authorized(&self, voter: &Address) -> Result<bool, GatewayError> {
        self.call(ContractMethod::AuthorizedVoters, Self::eth_address(voter)?)
            .await
    }

    async fn vote(&self, from: &Address, candidate_id: u64) -> Result<TxReceipt, GatewayError> {
        self.send(ContractMethod::Vote, from, U256::from(candidate_id))
            .await
    }

    async fn add_voter(&self, from: &Address, voter: &Address) -> Result<TxReceipt, GatewayError> {
        self.send(ContractMethod::AddVoter, from, Self::eth_address(voter)?)
            .await
    }

    async fn add_candidate(&self, from: &Address, name: &str) -> Result<TxReceipt, GatewayError> {
        self.send(ContractMethod::AddCandidate, from, name.to_string())
            .await
    }

    async fn toggle_election(&self, from: &Address) -> Result<TxReceipt, GatewayError> {
        self.send(ContractMethod::ToggleElection, from, ()).await
    }

    async fn reset_election(&self, from: &Address) -> Result<TxReceipt, GatewayError> {
        self.send(ContractMethod::ResetElection, from, ()).await
    }
}
