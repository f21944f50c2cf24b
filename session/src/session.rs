use ballot_gateway::{ContractGateway, Deployments, ProviderEvent, WalletProvider};
use ballot_types::{Address, ChainId, NetworkId, Role};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SessionError;

/// Everything established by a successful handshake.
#[derive(Clone)]
pub struct Connection {
    pub identity: Address,
    pub role: Role,
    pub chain_id: ChainId,
    pub network_id: NetworkId,
    pub contract: Address,
    pub gateway: Arc<dyn ContractGateway>,
    /// `electionOpen()` as read during the handshake. Only a hint: the
    /// synchronizer owns the authoritative phase.
    pub election_open: bool,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.identity)
            .field("role", &self.role)
            .field("chain_id", &self.chain_id)
            .field("network_id", &self.network_id)
            .field("contract", &self.contract)
            .field("election_open", &self.election_open)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connected(Connection),
}

/// What subscribers see.
#[derive(Clone, Debug, Default)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    /// Set while a handshake is running.
    pub loading: bool,
}

impl SessionSnapshot {
    pub fn connection(&self) -> Option<&Connection> {
        match &self.status {
            SessionStatus::Connected(c) => Some(c),
            SessionStatus::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection().is_some()
    }

    pub fn identity(&self) -> Option<&Address> {
        self.connection().map(|c| &c.identity)
    }

    pub fn role(&self) -> Option<Role> {
        self.connection().map(|c| c.role)
    }

    pub fn gateway(&self) -> Option<Arc<dyn ContractGateway>> {
        self.connection().map(|c| Arc::clone(&c.gateway))
    }
}

/// The wallet session.
///
/// Owned explicitly by whoever needs it (no globals). State changes are
/// published on a watch channel, see [`Session::subscribe`].
pub struct Session {
    provider: Option<Arc<dyn WalletProvider>>,
    deployments: Deployments,
    expected_chain: ChainId,
    state: watch::Sender<SessionSnapshot>,
    /// Serializes handshakes so that an event arriving mid-connect cannot
    /// interleave with it.
    handshake: Mutex<()>,
}

impl Session {
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        deployments: Deployments,
        expected_chain: ChainId,
    ) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            provider,
            deployments,
            expected_chain,
            state,
            handshake: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn expected_chain(&self) -> ChainId {
        self.expected_chain
    }

    /// Run the full handshake. On failure the session is left disconnected.
    pub async fn connect(&self) -> Result<Connection, SessionError> {
        let _guard = self.handshake.lock().await;
        self.state.send_modify(|s| s.loading = true);

        let result = self.handshake().await;
        match &result {
            Ok(connection) => {
                info!(
                    identity = %connection.identity,
                    role = %connection.role,
                    contract = %connection.contract,
                    "session connected"
                );
                self.state.send_replace(SessionSnapshot {
                    status: SessionStatus::Connected(connection.clone()),
                    loading: false,
                });
            }
            Err(e) => {
                warn!("connect failed: {e}");
                self.state.send_replace(SessionSnapshot::default());
            }
        }
        result
    }

    /// Clear the session.
    pub fn disconnect(&self) {
        let was_connected = self.state.borrow().is_connected();
        self.state.send_replace(SessionSnapshot::default());
        if was_connected {
            info!("session disconnected");
        }
    }

    /// Reconnect silently if the wallet already exposes accounts.
    pub async fn resume(&self) -> Result<Option<Connection>, SessionError> {
        let Some(provider) = &self.provider else {
            return Ok(None);
        };
        if provider.accounts().await?.is_empty() {
            debug!("no exposed accounts; staying disconnected");
            return Ok(None);
        }
        self.connect().await.map(Some)
    }

    /// Apply a provider notification.
    ///
    /// Returns the new connection, or `None` if the session ended.
    pub async fn handle_event(&self, event: ProviderEvent) -> Result<Option<Connection>, SessionError> {
        match event {
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                self.disconnect();
                Ok(None)
            }
            ProviderEvent::AccountsChanged(_) | ProviderEvent::ChainChanged(_) => {
                debug!(?event, "re-running handshake");
                self.connect().await.map(Some)
            }
        }
    }

    /// Follow provider notifications until `shutdown` fires.
    ///
    /// Returns `None` without a provider. Dropping the returned [`EventLoop`]
    /// stops the loop.
    pub fn spawn_event_loop(
        self: &Arc<Self>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<EventLoop> {
        let mut events = self.provider.as_ref()?.subscribe();
        let session = Arc::clone(self);

        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.recv() => break,
                    event = events.recv() => event,
                };
                let result = match event {
                    Ok(event) => session.handle_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "provider events lagged; reconnecting");
                        session.connect().await.map(Some)
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if let Err(e) = result {
                    debug!("provider event left session disconnected: {e}");
                }
            }
            debug!("session event loop stopped");
        });

        Some(EventLoop {
            handle: Some(handle),
        })
    }

    async fn handshake(&self) -> Result<Connection, SessionError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(SessionError::ProviderUnavailable)?;

        let identity = provider
            .request_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(SessionError::NoAccounts)?;

        let mut chain_id = provider.chain_id().await?;
        if chain_id != self.expected_chain {
            info!(expected = %self.expected_chain, actual = %chain_id, "requesting chain switch");
            if let Err(e) = provider.switch_chain(self.expected_chain).await {
                warn!("chain switch refused: {e}");
                return Err(SessionError::NetworkMismatch {
                    expected: self.expected_chain,
                    actual: chain_id,
                });
            }
            chain_id = self.expected_chain;
        }

        let network_id = provider.network_id().await?;
        let contract = self
            .deployments
            .address_for(network_id)
            .cloned()
            .ok_or(SessionError::ContractNotDeployed { network_id })?;
        let gateway = provider.bind_contract(&contract);

        let admin = gateway.admin().await?;
        let role = if admin == identity {
            Role::Admin
        } else {
            Role::Voter
        };
        let election_open = gateway.election_open().await?;

        Ok(Connection {
            identity,
            role,
            chain_id,
            network_id,
            contract,
            gateway,
            election_open,
        })
    }
}

/// Handle to the task spawned by [`Session::spawn_event_loop`].
pub struct EventLoop {
    handle: Option<JoinHandle<()>>,
}

impl EventLoop {
    /// Wait for the loop to finish (after shutdown).
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}
