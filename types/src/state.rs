//! State enums for elections, voters and sessions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle phase of an election.
///
/// The contract only stores an `electionOpen` flag, so `NotStarted` and
/// `Closed` are told apart by what happened earlier in the same epoch
/// (see [`ElectionPhase::derive`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionPhase {
    /// No voting has happened yet in this epoch.
    NotStarted,
    /// Ballots are being accepted.
    Open,
    /// Voting ended; results are final until the next reset.
    Closed,
}

impl ElectionPhase {
    /// Derive the phase from the contract flag.
    ///
    /// `seen_open` is whether the election was observed open earlier in the
    /// current epoch; `any_votes` is whether any candidate carries votes
    /// (votes can only be cast while open, so they imply a past open phase).
    pub fn derive(election_open: bool, seen_open: bool, any_votes: bool) -> Self {
        match (election_open, seen_open || any_votes) {
            (true, _) => Self::Open,
            (false, true) => Self::Closed,
            (false, false) => Self::NotStarted,
        }
    }

    /// Whether ballots are accepted.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Status line shown on the dashboards.
    pub fn status_line(&self) -> &'static str {
        match self {
            Self::NotStarted => "Election has not started",
            Self::Open => "Election in progress",
            Self::Closed => "Election has ended",
        }
    }
}

impl fmt::Display for ElectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not-started",
            Self::Open => "open",
            Self::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// A logical generation of the election, advanced only by a full reset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub const GENESIS: Epoch = Epoch(0);

    /// The epoch following this one.
    pub fn next(&self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {}", self.0)
    }
}

/// Per-identity voter flags within one epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoterStatus {
    /// Set by the admin's `addVoter`.
    pub is_authorized: bool,
    /// Flips true exactly once per epoch, on a successful `vote`.
    pub has_voted: bool,
}

impl VoterStatus {
    /// Whether this voter may cast a ballot while the election is in `phase`.
    pub fn can_vote(&self, phase: ElectionPhase) -> bool {
        self.is_authorized && !self.has_voted && phase.is_open()
    }
}

/// Role of a connected identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The identity matches the contract's `admin()`.
    Admin,
    /// Any other connected identity.
    Voter,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Voter => write!(f, "voter"),
        }
    }
}
