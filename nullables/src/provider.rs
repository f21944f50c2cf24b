//! Nullable wallet provider: scriptable accounts, chain and events.

use async_trait::async_trait;
use ballot_gateway::{ContractGateway, ProviderError, ProviderEvent, WalletProvider};
use ballot_types::{Address, ChainId, NetworkId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use crate::gateway::NullGateway;

/// A wallet provider whose every answer is set by the test.
///
/// Contracts are always bound to the shared [`NullGateway`], whatever address
/// is requested; the requested addresses are recorded.
pub struct NullProvider {
    accounts: Mutex<Vec<Address>>,
    chain: Mutex<ChainId>,
    network: Mutex<NetworkId>,
    allow_switch: AtomicBool,
    reject_accounts: Mutex<Option<String>>,
    gateway: Arc<NullGateway>,
    bound: Mutex<Vec<Address>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl NullProvider {
    /// A provider on Sepolia exposing `account`.
    pub fn new(gateway: Arc<NullGateway>, account: Address) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(vec![account]),
            chain: Mutex::new(ChainId::SEPOLIA),
            network: Mutex::new(NetworkId(ChainId::SEPOLIA.0)),
            allow_switch: AtomicBool::new(true),
            reject_accounts: Mutex::new(None),
            gateway,
            bound: Mutex::new(Vec::new()),
            events,
        }
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.lock().unwrap() = accounts;
    }

    pub fn set_chain(&self, chain: ChainId) {
        *self.chain.lock().unwrap() = chain;
    }

    pub fn set_network(&self, network: NetworkId) {
        *self.network.lock().unwrap() = network;
    }

    /// Whether `switch_chain` succeeds.
    pub fn allow_switch(&self, allow: bool) {
        self.allow_switch.store(allow, Ordering::SeqCst);
    }

    /// Make `request_accounts` fail as if the user declined the prompt.
    pub fn reject_account_request(&self, message: &str) {
        *self.reject_accounts.lock().unwrap() = Some(message.to_string());
    }

    /// Switch the exposed accounts and notify subscribers.
    pub fn switch_accounts(&self, accounts: Vec<Address>) {
        self.set_accounts(accounts.clone());
        let _ = self.events.send(ProviderEvent::AccountsChanged(accounts));
    }

    /// Switch chain and notify subscribers.
    pub fn switch_chain_externally(&self, chain: ChainId) {
        self.set_chain(chain);
        let _ = self.events.send(ProviderEvent::ChainChanged(chain));
    }

    pub fn current_chain(&self) -> ChainId {
        *self.chain.lock().unwrap()
    }

    pub fn bound_addresses(&self) -> Vec<Address> {
        self.bound.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletProvider for NullProvider {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        if let Some(message) = self.reject_accounts.lock().unwrap().clone() {
            return Err(ProviderError::Rejected(message));
        }
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Ok(self.current_chain())
    }

    async fn switch_chain(&self, chain: ChainId) -> Result<(), ProviderError> {
        if !self.allow_switch.load(Ordering::SeqCst) {
            return Err(ProviderError::SwitchRejected(
                "User rejected the request.".to_string(),
            ));
        }
        self.set_chain(chain);
        self.set_network(NetworkId(chain.0));
        Ok(())
    }

    async fn network_id(&self) -> Result<NetworkId, ProviderError> {
        Ok(*self.network.lock().unwrap())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    fn bind_contract(&self, address: &Address) -> Arc<dyn ContractGateway> {
        self.bound.lock().unwrap().push(address.clone());
        Arc::clone(&self.gateway) as Arc<dyn ContractGateway>
    }
}
