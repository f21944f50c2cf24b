//! Gateway to the deployed voting contract.
//!
//! The contract holds every election rule; this crate only knows how to call
//! it. It provides:
//! - [`ContractGateway`]: the read/write surface of the contract ABI
//! - [`WalletProvider`]: account, chain and signing access (the wallet side)
//! - [`RpcGateway`] / [`JsonRpcProvider`]: implementations over Ethereum JSON-RPC
//! - [`Deployments`]: network id → contract address, from build artifacts

pub mod abi;
pub mod contract;
pub mod deployments;
pub mod error;
pub mod eth;
pub mod provider;
pub mod rpc;

pub use abi::ContractMethod;
pub use contract::{ContractGateway, TxReceipt};
pub use deployments::Deployments;
pub use error::{AbiError, DeploymentError, GatewayError, ProviderError, RpcError};
pub use eth::{ReceiptPolicy, RpcGateway, DEFAULT_GAS_LIMIT};
pub use provider::{JsonRpcProvider, ProviderEvent, WalletProvider};
pub use rpc::RpcClient;
