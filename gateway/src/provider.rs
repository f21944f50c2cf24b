//! Wallet provider: the source of identities, chain information and signing.
//!
//! A browser wallet pushes `accountsChanged` / `chainChanged` notifications.
//! [`JsonRpcProvider`] talks to a plain JSON-RPC node instead, so it emulates
//! those notifications by polling `eth_accounts` and `eth_chainId`.

use async_trait::async_trait;
use ballot_types::{Address, ChainId, NetworkId};
use ethers_providers::Middleware;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::abi;
use crate::contract::ContractGateway;
use crate::error::{ProviderError, RpcError};
use crate::eth::{ReceiptPolicy, RpcGateway, DEFAULT_GAS_LIMIT};
use crate::rpc::RpcClient;

/// Notification pushed by the wallet provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The exposed accounts changed; empty means the wallet disconnected.
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another chain.
    ChainChanged(ChainId),
}

/// Wallet-side operations the session handshake needs.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet to expose its accounts (`eth_requestAccounts`).
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Accounts already exposed, without prompting (`eth_accounts`).
    async fn accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn chain_id(&self) -> Result<ChainId, ProviderError>;

    /// Ask the wallet to switch chains (`wallet_switchEthereumChain`).
    async fn switch_chain(&self, chain: ChainId) -> Result<(), ProviderError>;

    /// `net_version`, used to look up deployments.
    async fn network_id(&self) -> Result<NetworkId, ProviderError>;

    /// Subscribe to provider notifications.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Bind a contract gateway that signs through this provider.
    fn bind_contract(&self, address: &Address) -> Arc<dyn ContractGateway>;
}

fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, ProviderError> {
    raw.into_iter()
        .map(|a| Address::parse(a).map_err(|e| ProviderError::InvalidResponse(e.to_string())))
        .collect()
}

/// [`WalletProvider`] backed by a JSON-RPC node with unlocked accounts.
pub struct JsonRpcProvider {
    rpc: RpcClient,
    events: broadcast::Sender<ProviderEvent>,
    gas_limit: u64,
    receipts: ReceiptPolicy,
}

impl JsonRpcProvider {
    pub fn new(rpc: RpcClient) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            rpc,
            events,
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

    /// Probe the endpoint with `web3_clientVersion`.
    ///
    /// Returns `None` when nothing answers, which the session reports as an
    /// unavailable provider.
    pub async fn detect(rpc: RpcClient) -> Option<Self> {
        match rpc
            .call::<String, _>("web3_clientVersion", serde_json::json!([]))
            .await
        {
            Ok(version) => {
                info!(url = rpc.url(), %version, "wallet provider detected");
                Some(Self::new(rpc))
            }
            Err(e) => {
                warn!(url = rpc.url(), "no wallet provider: {e}");
                None
            }
        }
    }

    /// Push a notification to subscribers.
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Spawn a task that polls accounts and chain id every `interval` and
    /// emits a [`ProviderEvent`] whenever either changes.
    ///
    /// The task ends when `shutdown` fires.
    pub fn spawn_watcher(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            let mut last_accounts = provider.accounts().await.ok();
            let mut last_chain = provider.chain_id().await.ok();
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        debug!("provider watcher stopping");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                match provider.accounts().await {
                    Ok(accounts) if last_accounts.as_ref() != Some(&accounts) => {
                        debug!(count = accounts.len(), "accounts changed");
                        provider.emit(ProviderEvent::AccountsChanged(accounts.clone()));
                        last_accounts = Some(accounts);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("failed to poll accounts: {e}"),
                }

                match provider.chain_id().await {
                    Ok(chain) if last_chain != Some(chain) => {
                        debug!(%chain, "chain changed");
                        provider.emit(ProviderEvent::ChainChanged(chain));
                        last_chain = Some(chain);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("failed to poll chain id: {e}"),
                }
            }
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let raw: Vec<String> = match self
            .rpc
            .call("eth_requestAccounts", serde_json::json!([]))
            .await
        {
            Ok(accounts) => accounts,
            // Plain nodes do not implement the wallet permission request.
            Err(e) if e.is_method_not_found() => {
                self.rpc.call("eth_accounts", serde_json::json!([])).await?
            }
            Err(e) => return Err(e.into()),
        };
        parse_accounts(raw)
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let accounts = self
            .rpc
            .provider()
            .get_accounts()
            .await
            .map_err(RpcError::from)?;
        Ok(accounts.into_iter().map(abi::from_eth_address).collect())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let chain = self
            .rpc
            .provider()
            .get_chainid()
            .await
            .map_err(RpcError::from)?;
        abi::to_u64(chain)
            .map(ChainId)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn switch_chain(&self, chain: ChainId) -> Result<(), ProviderError> {
        let params = serde_json::json!([{ "chainId": chain.to_hex() }]);
        self.rpc
            .call::<serde_json::Value, _>("wallet_switchEthereumChain", params)
            .await
            .map(|_| ())
            .map_err(|e: RpcError| ProviderError::SwitchRejected(e.message()))
    }

    async fn network_id(&self) -> Result<NetworkId, ProviderError> {
        let raw = self
            .rpc
            .provider()
            .get_net_version()
            .await
            .map_err(RpcError::from)?;
        NetworkId::parse(&raw).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn bind_contract(&self, address: &Address) -> Arc<dyn ContractGateway> {
        Arc::new(
            RpcGateway::new(self.rpc.clone(), address.clone())
                .with_gas_limit(self.gas_limit)
                .with_receipt_policy(self.receipts),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounts_are_normalized() {
        let accounts = parse_accounts(vec!["0xABCDEF".into(), "0x01".into()]).unwrap();
        assert_eq!(accounts[0].as_str(), "0xabcdef");
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn empty_account_string_is_invalid() {
        assert!(parse_accounts(vec![String::new()]).is_err());
    }

    #[tokio::test]
    async fn emitted_events_reach_subscribers() {
        let provider = JsonRpcProvider::new(RpcClient::new("http://127.0.0.1:1").unwrap());
        let mut rx = provider.subscribe();
        provider.emit(ProviderEvent::ChainChanged(ChainId::SEPOLIA));
        assert_eq!(rx.recv().await.unwrap(), ProviderEvent::ChainChanged(ChainId::SEPOLIA));
    }

    #[tokio::test]
    async fn detect_returns_none_without_endpoint() {
        let rpc = RpcClient::with_timeout("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        assert!(JsonRpcProvider::detect(rpc).await.is_none());
    }
}
