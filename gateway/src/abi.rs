//! Voting contract ABI.
//!
//! Call data and return values go through an [`ethers_contract::BaseContract`]
//! built from the contract's JSON ABI, embedded at compile time.

use ballot_types::{Address, Candidate};
use ethers_contract::BaseContract;
use ethers_core::abi::{Abi, Detokenize, Tokenize};
use ethers_core::types::{Bytes, H160, U256};
use std::sync::OnceLock;

use crate::error::AbiError;

const VOTING_ABI: &str = include_str!("../abi/Voting.json");

static VOTING: OnceLock<Result<BaseContract, String>> = OnceLock::new();

/// The parsed voting contract ABI, shared by every gateway.
pub fn voting_contract() -> Result<&'static BaseContract, AbiError> {
    VOTING
        .get_or_init(|| {
            serde_json::from_str::<Abi>(VOTING_ABI)
                .map(BaseContract::from)
                .map_err(|e| e.to_string())
        })
        .as_ref()
        .map_err(|e| AbiError::Definition(e.clone()))
}

/// Every contract method the client calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContractMethod {
    Admin,
    ElectionOpen,
    CandidatesCount,
    Candidates,
    Voters,
    AuthorizedVoters,
    Vote,
    AddVoter,
    AddCandidate,
    ToggleElection,
    ResetElection,
}

impl ContractMethod {
    /// Method name as declared in the contract.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::ElectionOpen => "electionOpen",
            Self::CandidatesCount => "candidatesCount",
            Self::Candidates => "candidates",
            Self::Voters => "voters",
            Self::AuthorizedVoters => "authorizedVoters",
            Self::Vote => "vote",
            Self::AddVoter => "addVoter",
            Self::AddCandidate => "addCandidate",
            Self::ToggleElection => "toggleElection",
            Self::ResetElection => "resetElection",
        }
    }

    /// Whether calling this method mutates contract state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Vote
                | Self::AddVoter
                | Self::AddCandidate
                | Self::ToggleElection
                | Self::ResetElection
        )
    }

    /// Selector followed by the encoded arguments.
    pub fn encode<T: Tokenize>(&self, args: T) -> Result<Bytes, AbiError> {
        voting_contract()?
            .encode(self.name(), args)
            .map_err(|e| AbiError::Codec(e.to_string()))
    }

    /// Decode this method's return data.
    pub fn decode<D: Detokenize>(&self, data: &Bytes) -> Result<D, AbiError> {
        voting_contract()?
            .decode_output(self.name(), data)
            .map_err(|e| AbiError::Codec(e.to_string()))
    }
}

/// `uint256` narrowed to the `u64` ids and counts the client works with.
pub fn to_u64(value: U256) -> Result<u64, AbiError> {
    if value.bits() > 64 {
        return Err(AbiError::Overflow);
    }
    Ok(value.as_u64())
}

pub fn to_eth_address(address: &Address) -> Result<H160, AbiError> {
    address
        .to_bytes()
        .map(H160::from)
        .map_err(|e| AbiError::Codec(e.to_string()))
}

pub fn from_eth_address(address: H160) -> Address {
    Address::from_bytes(address.0)
}

/// Decode the `(id, name, voteCount)` outputs of `candidates(uint256)`.
pub fn decode_candidate(data: &Bytes) -> Result<Candidate, AbiError> {
    let (id, name, vote_count): (U256, String, U256) = ContractMethod::Candidates.decode(data)?;
    Ok(Candidate {
        id: to_u64(id)?,
        name,
        vote_count: to_u64(vote_count)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers_core::abi::{encode, Token};

    fn selector(data: &Bytes) -> String {
        hex::encode(&data[..4])
    }

    #[test]
    fn embedded_abi_covers_every_method() {
        let contract = voting_contract().unwrap();
        for method in [
            ContractMethod::Admin,
            ContractMethod::ElectionOpen,
            ContractMethod::CandidatesCount,
            ContractMethod::Candidates,
            ContractMethod::Voters,
            ContractMethod::AuthorizedVoters,
            ContractMethod::Vote,
            ContractMethod::AddVoter,
            ContractMethod::AddCandidate,
            ContractMethod::ToggleElection,
            ContractMethod::ResetElection,
        ] {
            assert!(contract.abi().function(method.name()).is_ok(), "{}", method.name());
        }
    }

    #[test]
    fn well_known_selectors() {
        assert_eq!(selector(&ContractMethod::Admin.encode(()).unwrap()), "f851a440");
        assert_eq!(
            selector(&ContractMethod::Vote.encode(U256::from(1)).unwrap()),
            "0121b93f"
        );
    }

    #[test]
    fn only_mutating_methods_are_writes() {
        assert!(ContractMethod::Vote.is_write());
        assert!(ContractMethod::ResetElection.is_write());
        assert!(!ContractMethod::Candidates.is_write());
        assert!(!ContractMethod::Admin.is_write());
    }

    #[test]
    fn string_argument_uses_offset_length_and_padding() {
        let data = ContractMethod::AddCandidate
            .encode("Alice".to_string())
            .unwrap();
        let body = &data[4..];
        assert_eq!(body.len(), 3 * 32);
        assert_eq!(body[31], 32);
        assert_eq!(body[63], 5);
        assert_eq!(&body[64..69], b"Alice");
        assert!(body[69..].iter().all(|b| *b == 0));
    }

    #[test]
    fn wrong_argument_shape_is_rejected() {
        assert!(matches!(
            ContractMethod::AddVoter.encode(U256::from(1)),
            Err(AbiError::Codec(_))
        ));
    }

    #[test]
    fn decodes_candidate_outputs() {
        let data = Bytes::from(encode(&[
            Token::Uint(U256::from(2)),
            Token::String("Bob".into()),
            Token::Uint(U256::from(7)),
        ]));
        assert_eq!(decode_candidate(&data).unwrap(), Candidate::new(2, "Bob", 7));
    }

    #[test]
    fn truncated_candidate_is_an_error() {
        let data = Bytes::from(encode(&[Token::Uint(U256::from(1))]));
        assert!(matches!(decode_candidate(&data), Err(AbiError::Codec(_))));
    }

    #[test]
    fn large_uint_overflows() {
        assert_eq!(to_u64(U256::from(u64::MAX)), Ok(u64::MAX));
        assert_eq!(to_u64(U256::from(u64::MAX) + U256::one()), Err(AbiError::Overflow));
    }

    #[test]
    fn addresses_convert_both_ways() {
        let address = Address::parse(format!("0x{}", "11".repeat(20))).unwrap();
        let eth = to_eth_address(&address).unwrap();
        assert_eq!(eth, H160::repeat_byte(0x11));
        assert_eq!(from_eth_address(eth), address);
        assert!(to_eth_address(&Address::parse("0xA").unwrap()).is_err());
    }
}
