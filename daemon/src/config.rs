//! Client configuration with TOML file support.

use ballot_gateway::{Deployments, ReceiptPolicy, DEFAULT_GAS_LIMIT};
use ballot_types::{Address, ChainId};
use ballot_utils::LogFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid deployments: {0}")]
    Deployments(#[from] ballot_gateway::DeploymentError),
}

/// Configuration for the ballot client.
///
/// Can be loaded from a TOML file via [`BallotConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BallotConfig {
    /// JSON-RPC endpoint of the wallet provider or node.
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// Chain the contract lives on; the wallet is asked to switch to it.
    #[serde(default = "default_chain_id")]
    pub expected_chain_id: ChainId,

    /// Compiled contract artifact with a `networks` section.
    #[serde(default)]
    pub artifact_path: Option<PathBuf>,

    /// Network id → contract address. Overrides the artifact.
    #[serde(default)]
    pub deployments: BTreeMap<String, Address>,

    /// Gas budget attached to every transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,

    /// How long to wait for a transaction to be mined.
    #[serde(default = "default_receipt_timeout_secs")]
    pub receipt_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,

    /// Interval for polling accounts and chain id (provider events).
    #[serde(default = "default_provider_poll_ms")]
    pub provider_poll_ms: u64,

    /// HTTP proxy port.
    #[serde(default = "default_proxy_port")]
    pub proxy_port: u16,

    /// Contract the proxy talks to; looked up from deployments if unset.
    #[serde(default)]
    pub proxy_contract: Option<Address>,

    /// Whether the proxy serves `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_rpc_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_chain_id() -> ChainId {
    ChainId::SEPOLIA
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_receipt_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_ms() -> u64 {
    1_000
}

fn default_provider_poll_ms() -> u64 {
    2_000
}

fn default_proxy_port() -> u16 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl BallotConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Deployments from the artifact, overridden by the `[deployments]` table.
    pub fn deployments(&self) -> Result<Deployments, ConfigError> {
        let mut deployments = match &self.artifact_path {
            Some(path) => Deployments::from_artifact_file(path)?,
            None => Deployments::new(),
        };
        deployments.merge(Deployments::from_table(&self.deployments)?);
        Ok(deployments)
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy {
            poll_interval: Duration::from_millis(self.receipt_poll_ms),
            timeout: Duration::from_secs(self.receipt_timeout_secs),
        }
    }

    pub fn provider_poll_interval(&self) -> Duration {
        Duration::from_millis(self.provider_poll_ms)
    }
}

impl Default for BallotConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            expected_chain_id: default_chain_id(),
            artifact_path: None,
            deployments: BTreeMap::new(),
            gas_limit: default_gas_limit(),
            receipt_timeout_secs: default_receipt_timeout_secs(),
            receipt_poll_ms: default_receipt_poll_ms(),
            provider_poll_ms: default_provider_poll_ms(),
            proxy_port: default_proxy_port(),
            proxy_contract: None,
            enable_metrics: false,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
