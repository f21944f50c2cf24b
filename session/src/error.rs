use ballot_gateway::{GatewayError, ProviderError};
use ballot_types::{ChainId, NetworkId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no wallet provider available; install or unlock a wallet")]
    ProviderUnavailable,

    #[error("the wallet exposed no accounts")]
    NoAccounts,

    #[error("wrong network: expected {expected}, wallet is on {actual}")]
    NetworkMismatch { expected: ChainId, actual: ChainId },

    #[error("voting contract is not deployed on network {network_id}")]
    ContractNotDeployed { network_id: NetworkId },

    #[error("wallet provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("contract read failed: {0}")]
    Read(#[from] GatewayError),
}

impl SessionError {
    /// Whether the user has to act (install a wallet, unlock it, switch
    /// network) before a retry can succeed.
    pub fn needs_user_action(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable
                | Self::NoAccounts
                | Self::NetworkMismatch { .. }
                | Self::ContractNotDeployed { .. }
        )
    }
}
