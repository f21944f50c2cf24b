//! Candidate record as stored by the contract.

use serde::{Deserialize, Serialize};

/// A ballot entry. Ids are dense and start at 1.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub vote_count: u64,
}

impl Candidate {
    pub fn new(id: u64, name: impl Into<String>, vote_count: u64) -> Self {
        Self {
            id,
            name: name.into(),
            vote_count,
        }
    }
}
