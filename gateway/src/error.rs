use thiserror::Error;

/// Failure of a contract call, as surfaced to the user.
///
/// `Read` and `Write` carry the node's human-readable message verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{method}() call failed: {message}")]
    Read {
        method: &'static str,
        message: String,
    },

    #[error("{method}() transaction failed: {message}")]
    Write {
        method: &'static str,
        message: String,
    },

    #[error("{method}() transaction {tx_hash} was reverted")]
    Reverted {
        method: &'static str,
        tx_hash: String,
    },

    #[error("could not decode {method}() result: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GatewayError {
    /// The raw message to show the user.
    pub fn message(&self) -> String {
        match self {
            Self::Read { message, .. } | Self::Write { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the failure came from a read call.
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Decode { .. })
    }
}

/// Failure of the JSON-RPC transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{message} (code {code})")]
    Remote { code: i64, message: String },

    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

impl RpcError {
    /// JSON-RPC code for "method not found".
    pub const METHOD_NOT_FOUND: i64 = -32601;

    /// Human-readable message without the code suffix.
    pub fn message(&self) -> String {
        match self {
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_method_not_found(&self) -> bool {
        matches!(self, Self::Remote { code, .. } if *code == Self::METHOD_NOT_FOUND)
    }
}

impl From<ethers_providers::ProviderError> for RpcError {
    fn from(e: ethers_providers::ProviderError) -> Self {
        use ethers_providers::RpcError as _;

        if let Some(remote) = e.as_error_response() {
            return RpcError::Remote {
                code: remote.code,
                message: remote.message.clone(),
            };
        }
        match e.as_serde_error() {
            Some(serde) => RpcError::InvalidResponse(serde.to_string()),
            None => RpcError::Transport(e.to_string()),
        }
    }
}

/// Failure while encoding or decoding ABI data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("invalid contract ABI: {0}")]
    Definition(String),

    #[error("{0}")]
    Codec(String),

    #[error("integer does not fit in 64 bits")]
    Overflow,
}

/// Failure of the wallet provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("chain switch rejected: {0}")]
    SwitchRejected(String),

    #[error("provider unreachable: {0}")]
    Transport(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl From<RpcError> for ProviderError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Transport(msg) => ProviderError::Transport(msg),
            RpcError::Remote { message, .. } => ProviderError::Rejected(message),
            RpcError::InvalidResponse(msg) => ProviderError::InvalidResponse(msg),
        }
    }
}

/// Failure while loading deployment addresses.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact: {0}")]
    Parse(String),

    #[error("invalid network id {0:?}")]
    InvalidNetwork(String),
}
