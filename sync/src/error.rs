use ballot_gateway::GatewayError;
use thiserror::Error;

/// A client-side check that failed before any write was sent.
///
/// The display text is the notification shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Precondition {
    #[error("Please select a candidate to vote.")]
    NoCandidateSelected,

    #[error("Candidate {0} is not on the ballot.")]
    UnknownCandidate(u64),

    #[error("You are not authorized to vote.")]
    NotAuthorized,

    #[error("You have already voted!")]
    AlreadyVoted,

    #[error("The election is not open for voting.")]
    ElectionNotOpen,

    #[error("Please enter a {0}.")]
    EmptyInput(&'static str),

    #[error("{0:?} is not a valid address.")]
    InvalidAddress(String),

    #[error("Only the admin can manage the election.")]
    AdminOnly,

    #[error("Add candidates and then start the election.")]
    NoCandidates,

    #[error("End the election before resetting it.")]
    ResetWhileOpen,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("{0}")]
    Rejected(#[from] Precondition),

    /// A read failed; the previously published view stays displayed.
    #[error("{}", .0.message())]
    Read(GatewayError),

    /// A write failed; nothing changed.
    #[error("{}", .0.message())]
    Write(GatewayError),
}

impl SyncError {
    /// Whether a write was attempted.
    pub fn reached_contract(&self) -> bool {
        matches!(self, Self::Write(_))
    }
}
