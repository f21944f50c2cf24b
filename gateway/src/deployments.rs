//! Where the voting contract is deployed, per network.
//!
//! Build tools record deployments in the compiled artifact:
//!
//! ```json
//! { "contractName": "VotingSystem", "networks": { "11155111": { "address": "0x…" } } }
//! ```
//!
//! The same mapping can also be given directly in configuration.

use ballot_types::{Address, NetworkId};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::DeploymentError;

#[derive(Debug, Deserialize)]
struct Artifact {
    #[serde(rename = "contractName", default)]
    contract_name: Option<String>,
    #[serde(default)]
    networks: BTreeMap<String, ArtifactNetwork>,
}

#[derive(Debug, Deserialize)]
struct ArtifactNetwork {
    address: Address,
}

/// Contract address per network id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deployments {
    by_network: BTreeMap<NetworkId, Address>,
}

impl Deployments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, network: NetworkId, address: Address) {
        self.by_network.insert(network, address);
    }

    /// The contract address on `network`, if deployed there.
    pub fn address_for(&self, network: NetworkId) -> Option<&Address> {
        self.by_network.get(&network)
    }

    pub fn is_empty(&self) -> bool {
        self.by_network.is_empty()
    }

    pub fn networks(&self) -> impl Iterator<Item = NetworkId> + '_ {
        self.by_network.keys().copied()
    }

    /// Entries from `other` take precedence.
    pub fn merge(&mut self, other: Deployments) {
        self.by_network.extend(other.by_network);
    }

    /// Build from a string-keyed table such as a `[deployments]` TOML section.
    pub fn from_table(table: &BTreeMap<String, Address>) -> Result<Self, DeploymentError> {
        let mut deployments = Self::new();
        for (key, address) in table {
            let network = NetworkId::parse(key)
                .map_err(|_| DeploymentError::InvalidNetwork(key.clone()))?;
            deployments.insert(network, address.clone());
        }
        Ok(deployments)
    }

    /// Parse the `networks` section of a compiled contract artifact.
    pub fn from_artifact_json(json: &str) -> Result<Self, DeploymentError> {
        let artifact: Artifact =
            serde_json::from_str(json).map_err(|e| DeploymentError::Parse(e.to_string()))?;
        let table = artifact
            .networks
            .into_iter()
            .map(|(k, v)| (k, v.address))
            .collect();
        let deployments = Self::from_table(&table)?;
        tracing::debug!(
            contract = artifact.contract_name.as_deref().unwrap_or("unnamed"),
            networks = deployments.by_network.len(),
            "loaded deployment artifact"
        );
        Ok(deployments)
    }

    pub fn from_artifact_file(path: impl AsRef<Path>) -> Result<Self, DeploymentError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DeploymentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_artifact_json(&content)
    }
}
