//! The derived, displayable election state.

use ballot_types::{Candidate, ElectionPhase, Epoch, VoterStatus};
use serde::Serialize;
use std::fmt;

/// Which dashboard a view feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Audience {
    /// Election controls and results; voter flags are not read.
    Admin,
    /// Ballot and results for the connected identity.
    Voter,
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Voter => write!(f, "voter"),
        }
    }
}

/// Snapshot of everything a dashboard shows.
///
/// Always built from one complete set of reads, never patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub epoch: Epoch,
    pub phase: ElectionPhase,
    pub is_authorized: bool,
    pub has_voted: bool,
    pub candidates: Vec<Candidate>,
    pub results_visible: bool,
    pub audience: Audience,
}

impl ViewState {
    /// The empty view shown at the start of an epoch, before any read.
    pub fn initial(epoch: Epoch, audience: Audience) -> Self {
        Self::derive(
            epoch,
            audience,
            ElectionPhase::NotStarted,
            VoterStatus::default(),
            Vec::new(),
        )
    }

    pub fn derive(
        epoch: Epoch,
        audience: Audience,
        phase: ElectionPhase,
        status: VoterStatus,
        candidates: Vec<Candidate>,
    ) -> Self {
        let results_visible = match audience {
            Audience::Voter => status.has_voted || !phase.is_open(),
            Audience::Admin => !candidates.is_empty(),
        };
        Self {
            epoch,
            phase,
            is_authorized: status.is_authorized,
            has_voted: status.has_voted,
            candidates,
            results_visible,
            audience,
        }
    }

    pub fn voter_status(&self) -> VoterStatus {
        VoterStatus {
            is_authorized: self.is_authorized,
            has_voted: self.has_voted,
        }
    }

    /// Candidates the identity may vote for right now; empty unless the
    /// identity is authorized, has not voted and the election is open.
    pub fn votable_candidates(&self) -> &[Candidate] {
        if self.audience == Audience::Voter && self.voter_status().can_vote(self.phase) {
            &self.candidates
        } else {
            &[]
        }
    }

    pub fn candidate(&self, id: u64) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    pub fn total_votes(&self) -> u64 {
        self.candidates.iter().map(|c| c.vote_count).sum()
    }

    pub fn results_heading(&self) -> &'static str {
        if self.phase.is_open() {
            "Live Results"
        } else {
            "Final Results"
        }
    }
}
