//! Plain-text rendering of dashboard views.

use ballot_sync::{Audience, ViewState};
use ballot_types::Address;
use std::fmt::Write;

pub fn dashboard(view: &ViewState, identity: &Address) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} dashboard for {}", title(view.audience), identity.short());
    let _ = writeln!(out, "Status: {}", view.phase.status_line());

    if view.audience == Audience::Voter {
        let eligibility = match (view.is_authorized, view.has_voted) {
            (false, _) => "not authorized to vote",
            (true, true) => "vote cast",
            (true, false) => "authorized to vote",
        };
        let _ = writeln!(out, "You are {eligibility}");
    }

    if view.candidates.is_empty() {
        let _ = writeln!(out, "No candidates yet.");
        return out;
    }

    let votable = view.votable_candidates();
    if !votable.is_empty() {
        let _ = writeln!(out, "\nBallot:");
        for candidate in votable {
            let _ = writeln!(out, "  [{}] {}", candidate.id, candidate.name);
        }
    }

    if view.results_visible {
        let total = view.total_votes();
        let _ = writeln!(out, "\n{} ({total} votes)", view.results_heading());
        for candidate in &view.candidates {
            let _ = writeln!(
                out,
                "  [{}] {:<20} {:>6}  {:>5.1}%",
                candidate.id,
                candidate.name,
                candidate.vote_count,
                share(candidate.vote_count, total)
            );
        }
    }
    out
}

fn title(audience: Audience) -> &'static str {
    match audience {
        Audience::Admin => "Admin",
        Audience::Voter => "Voter",
    }
}

fn share(votes: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        votes as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_types::{Candidate, ElectionPhase, Epoch, VoterStatus};

    fn voter() -> Address {
        Address::parse("0xC").unwrap()
    }

    fn view(phase: ElectionPhase, status: VoterStatus) -> ViewState {
        ViewState::derive(
            Epoch(0),
            Audience::Voter,
            phase,
            status,
            vec![Candidate::new(1, "Alice", 3), Candidate::new(2, "Bob", 1)],
        )
    }

    #[test]
    fn open_ballot_hides_results_until_voted() {
        let status = VoterStatus {
            is_authorized: true,
            has_voted: false,
        };
        let text = dashboard(&view(ElectionPhase::Open, status), &voter());
        assert!(text.contains("Ballot:"));
        assert!(text.contains("[2] Bob"));
        assert!(!text.contains("Live Results"));
    }

    #[test]
    fn voted_voter_sees_live_results() {
        let status = VoterStatus {
            is_authorized: true,
            has_voted: true,
        };
        let text = dashboard(&view(ElectionPhase::Open, status), &voter());
        assert!(!text.contains("Ballot:"));
        assert!(text.contains("Live Results (4 votes)"));
        assert!(text.contains("75.0%"));
    }

    #[test]
    fn closed_election_shows_final_results() {
        let text = dashboard(&view(ElectionPhase::Closed, VoterStatus::default()), &voter());
        assert!(text.contains("Election has ended"));
        assert!(text.contains("not authorized"));
        assert!(text.contains("Final Results"));
    }

    #[test]
    fn empty_admin_view() {
        let view = ViewState::initial(Epoch(0), Audience::Admin);
        let text = dashboard(&view, &Address::parse("0xA").unwrap());
        assert!(text.starts_with("Admin dashboard"));
        assert!(text.contains("No candidates yet."));
    }

    #[test]
    fn share_handles_zero_total() {
        assert_eq!(share(0, 0), 0.0);
        assert_eq!(share(1, 4), 25.0);
    }
}
