//! Admin actions that need explicit confirmation.

use ballot_types::ElectionPhase;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdminAction {
    StartElection,
    EndElection,
    ResetElection,
}

impl AdminAction {
    /// The toggle action available in `phase`.
    pub fn toggle_for(phase: ElectionPhase) -> Self {
        if phase.is_open() {
            Self::EndElection
        } else {
            Self::StartElection
        }
    }

    /// Question put to the admin before the write is sent.
    pub fn confirmation_prompt(&self) -> &'static str {
        match self {
            Self::StartElection => "Do you want to start the election?",
            Self::EndElection => {
                "Are you sure you want to end the election? This cannot be undone."
            }
            Self::ResetElection => {
                "Are you sure you want to reset the entire election? This will delete all candidates, voters, and votes."
            }
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::StartElection => "start",
            Self::EndElection => "end",
            Self::ResetElection => "reset",
        };
        write!(f, "{s}")
    }
}
