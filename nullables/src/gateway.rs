//! Nullable contract gateway: an in-memory voting contract.

use async_trait::async_trait;
use ballot_gateway::{ContractGateway, ContractMethod, GatewayError, TxReceipt};
use ballot_types::{Address, Candidate};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;

/// A write that reached the contract (successful or not).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedWrite {
    pub method: ContractMethod,
    pub from: Address,
}

#[derive(Default)]
struct ContractState {
    admin: Option<Address>,
    election_open: bool,
    candidates: Vec<Candidate>,
    voters: HashSet<Address>,
    authorized: HashSet<Address>,
    tx_count: u64,
}

/// An in-memory stand-in for the deployed voting contract.
///
/// Enforces the contract's rules: only the admin may manage the election,
/// candidates are frozen while the election is open, and each authorized
/// voter votes at most once per election.
pub struct NullGateway {
    address: Address,
    state: Mutex<ContractState>,
    read_failures: Mutex<HashMap<ContractMethod, String>>,
    next_write_failure: Mutex<Option<String>>,
    writes: Mutex<Vec<RecordedWrite>>,
    read_counts: Mutex<HashMap<ContractMethod, usize>>,
    paused: watch::Sender<HashSet<ContractMethod>>,
    blocked: AtomicUsize,
}

impl NullGateway {
    pub const ONLY_ADMIN: &'static str = "Only admin can perform this action";
    pub const NOT_OPEN: &'static str = "Election is not open";
    pub const NOT_AUTHORIZED: &'static str = "You are not authorized to vote";
    pub const ALREADY_VOTED: &'static str = "You have already voted";
    pub const INVALID_CANDIDATE: &'static str = "Invalid candidate";
    pub const CANDIDATES_FROZEN: &'static str = "Cannot add candidates while the election is open";

    /// A contract administered by `admin`.
    pub fn new(admin: Address) -> Self {
        let (paused, _) = watch::channel(HashSet::new());
        Self {
            address: Address::from_bytes([0x42; Address::LEN]),
            state: Mutex::new(ContractState {
                admin: Some(admin),
                ..Default::default()
            }),
            read_failures: Mutex::new(HashMap::new()),
            next_write_failure: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            read_counts: Mutex::new(HashMap::new()),
            paused,
            blocked: AtomicUsize::new(0),
        }
    }

    // ── Seeding (bypasses access control) ──────────────────────────────

    pub fn seed_candidate(&self, name: &str, votes: u64) {
        let mut state = self.state.lock().unwrap();
        let id = state.candidates.len() as u64 + 1;
        state.candidates.push(Candidate::new(id, name, votes));
    }

    pub fn seed_authorized(&self, voter: &Address) {
        self.state.lock().unwrap().authorized.insert(voter.clone());
    }

    pub fn seed_open(&self, open: bool) {
        self.state.lock().unwrap().election_open = open;
    }

    // ── Failure injection ──────────────────────────────────────────────

    /// Make every read of `method` fail with `message` until cleared.
    pub fn fail_reads(&self, method: ContractMethod, message: &str) {
        self.read_failures
            .lock()
            .unwrap()
            .insert(method, message.to_string());
    }

    pub fn clear_read_failures(&self) {
        self.read_failures.lock().unwrap().clear();
    }

    /// Make the next write fail with `message` without touching state.
    pub fn fail_next_write(&self, message: &str) {
        *self.next_write_failure.lock().unwrap() = Some(message.to_string());
    }

    // ── Read gating ────────────────────────────────────────────────────

    /// Hold every subsequent read of `method` until [`resume_reads`] is called.
    ///
    /// [`resume_reads`]: NullGateway::resume_reads
    pub fn pause_reads(&self, method: ContractMethod) {
        self.paused.send_modify(|set| {
            set.insert(method);
        });
    }

    pub fn resume_reads(&self) {
        self.paused.send_modify(|set| set.clear());
    }

    /// Number of reads currently held by [`pause_reads`](NullGateway::pause_reads).
    pub fn blocked_reads(&self) -> usize {
        self.blocked.load(Ordering::SeqCst)
    }

    // ── Inspection ─────────────────────────────────────────────────────

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn read_count(&self, method: ContractMethod) -> usize {
        self.read_counts
            .lock()
            .unwrap()
            .get(&method)
            .copied()
            .unwrap_or(0)
    }

    pub fn candidates_snapshot(&self) -> Vec<Candidate> {
        self.state.lock().unwrap().candidates.clone()
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().unwrap().election_open
    }

    // ── Internals ──────────────────────────────────────────────────────

    async fn begin_read(&self, method: ContractMethod) -> Result<(), GatewayError> {
        let mut rx = self.paused.subscribe();
        if rx.borrow().contains(&method) {
            self.blocked.fetch_add(1, Ordering::SeqCst);
            let _ = rx.wait_for(|set| !set.contains(&method)).await;
            self.blocked.fetch_sub(1, Ordering::SeqCst);
        }

        *self.read_counts.lock().unwrap().entry(method).or_insert(0) += 1;

        match self.read_failures.lock().unwrap().get(&method) {
            Some(message) => Err(GatewayError::Read {
                method: method.name(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn write<F>(&self, method: ContractMethod, from: &Address, apply: F) -> Result<TxReceipt, GatewayError>
    where
        F: FnOnce(&mut ContractState) -> Result<(), &'static str>,
    {
        self.writes.lock().unwrap().push(RecordedWrite {
            method,
            from: from.clone(),
        });

        let reject = |message: String| GatewayError::Write {
            method: method.name(),
            message,
        };

        if let Some(message) = self.next_write_failure.lock().unwrap().take() {
            return Err(reject(message));
        }

        let mut state = self.state.lock().unwrap();
        apply(&mut state).map_err(|m| reject(format!("execution reverted: {m}")))?;
        state.tx_count += 1;
        Ok(TxReceipt {
            transaction_hash: format!("0x{:064x}", state.tx_count),
            block_number: Some(state.tx_count),
        })
    }

    fn require_admin(state: &ContractState, from: &Address) -> Result<(), &'static str> {
        if state.admin.as_ref() == Some(from) {
            Ok(())
        } else {
            Err(Self::ONLY_ADMIN)
        }
    }
}

#[async_trait]
impl ContractGateway for NullGateway {
    fn contract_address(&self) -> Address {
        self.address.clone()
    }

    async fn admin(&self) -> Result<Address, GatewayError> {
        self.begin_read(ContractMethod::Admin).await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .admin
            .clone()
            .unwrap_or_else(|| Address::from_bytes([0; Address::LEN])))
    }

    async fn election_open(&self) -> Result<bool, GatewayError> {
        self.begin_read(ContractMethod::ElectionOpen).await?;
        Ok(self.state.lock().unwrap().election_open)
    }

    async fn candidates_count(&self) -> Result<u64, GatewayError> {
        self.begin_read(ContractMethod::CandidatesCount).await?;
        Ok(self.state.lock().unwrap().candidates.len() as u64)
    }

    async fn candidate(&self, id: u64) -> Result<Candidate, GatewayError> {
        self.begin_read(ContractMethod::Candidates).await?;
        let state = self.state.lock().unwrap();
        // Solidity mappings return a zeroed struct for unknown keys.
        Ok(id
            .checked_sub(1)
            .and_then(|i| state.candidates.get(i as usize))
            .cloned()
            .unwrap_or_else(|| Candidate::new(0, "", 0)))
    }

    async fn has_voted(&self, voter: &Address) -> Result<bool, GatewayError> {
        self.begin_read(ContractMethod::Voters).await?;
        Ok(self.state.lock().unwrap().voters.contains(voter))
    }

    async fn is_authorized(&self, voter: &Address) -> Result<bool, GatewayError> {
        self.begin_read(ContractMethod::AuthorizedVoters).await?;
        Ok(self.state.lock().unwrap().authorized.contains(voter))
    }

    async fn vote(&self, from: &Address, candidate_id: u64) -> Result<TxReceipt, GatewayError> {
        self.write(ContractMethod::Vote, from, |state| {
            if !state.election_open {
                return Err(Self::NOT_OPEN);
            }
            if !state.authorized.contains(from) {
                return Err(Self::NOT_AUTHORIZED);
            }
            if state.voters.contains(from) {
                return Err(Self::ALREADY_VOTED);
            }
            let index = candidate_id
                .checked_sub(1)
                .filter(|i| (*i as usize) < state.candidates.len())
                .ok_or(Self::INVALID_CANDIDATE)?;
            state.candidates[index as usize].vote_count += 1;
            state.voters.insert(from.clone());
            Ok(())
        })
    }

    async fn add_voter(&self, from: &Address, voter: &Address) -> Result<TxReceipt, GatewayError> {
        self.write(ContractMethod::AddVoter, from, |state| {
            Self::require_admin(state, from)?;
            state.authorized.insert(voter.clone());
            Ok(())
        })
    }

    async fn add_candidate(&self, from: &Address, name: &str) -> Result<TxReceipt, GatewayError> {
        self.write(ContractMethod::AddCandidate, from, |state| {
            Self::require_admin(state, from)?;
            if state.election_open {
                return Err(Self::CANDIDATES_FROZEN);
            }
            let id = state.candidates.len() as u64 + 1;
            state.candidates.push(Candidate::new(id, name, 0));
            Ok(())
        })
    }

    async fn toggle_election(&self, from: &Address) -> Result<TxReceipt, GatewayError> {
        self.write(ContractMethod::ToggleElection, from, |state| {
            Self::require_admin(state, from)?;
            state.election_open = !state.election_open;
            Ok(())
        })
    }

    async fn reset_election(&self, from: &Address) -> Result<TxReceipt, GatewayError> {
        self.write(ContractMethod::ResetElection, from, |state| {
            Self::require_admin(state, from)?;
            state.election_open = false;
            state.candidates.clear();
            state.voters.clear();
            state.authorized.clear();
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[tokio::test]
    async fn admin_manages_candidates_and_phase() {
        let admin = addr("0xA");
        let gw = NullGateway::new(admin.clone());
        gw.add_candidate(&admin, "Alice").await.unwrap();
        gw.add_candidate(&admin, "Bob").await.unwrap();
        gw.toggle_election(&admin).await.unwrap();

        assert!(gw.election_open().await.unwrap());
        assert_eq!(gw.candidates_count().await.unwrap(), 2);
        assert_eq!(gw.candidate(2).await.unwrap(), Candidate::new(2, "Bob", 0));
    }

    #[tokio::test]
    async fn non_admin_writes_revert() {
        let gw = NullGateway::new(addr("0xA"));
        let err = gw.add_candidate(&addr("0xB"), "Eve").await.unwrap_err();
        assert_eq!(
            err.message(),
            format!("execution reverted: {}", NullGateway::ONLY_ADMIN)
        );
        assert_eq!(gw.writes().len(), 1);
        assert!(gw.candidates_snapshot().is_empty());
    }

    #[tokio::test]
    async fn vote_rules_are_enforced() {
        let admin = addr("0xA");
        let voter = addr("0xC");
        let gw = NullGateway::new(admin.clone());
        gw.seed_candidate("Alice", 0);
        gw.seed_authorized(&voter);

        assert!(gw.vote(&voter, 1).await.is_err(), "closed election");
        gw.seed_open(true);
        assert!(gw.vote(&addr("0xD"), 1).await.is_err(), "unauthorized");
        assert!(gw.vote(&voter, 9).await.is_err(), "unknown candidate");
        gw.vote(&voter, 1).await.unwrap();
        assert!(gw.vote(&voter, 1).await.is_err(), "double vote");
        assert_eq!(gw.candidate(1).await.unwrap().vote_count, 1);
        assert!(gw.has_voted(&voter).await.unwrap());
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let admin = addr("0xA");
        let voter = addr("0xC");
        let gw = NullGateway::new(admin.clone());
        gw.seed_candidate("Alice", 4);
        gw.seed_authorized(&voter);
        gw.reset_election(&admin).await.unwrap();

        assert_eq!(gw.candidates_count().await.unwrap(), 0);
        assert!(!gw.is_authorized(&voter).await.unwrap());
        assert!(!gw.election_open().await.unwrap());
    }

    #[tokio::test]
    async fn injected_failures_surface_messages() {
        let gw = NullGateway::new(addr("0xA"));
        gw.fail_reads(ContractMethod::Voters, "header not found");
        let err = gw.has_voted(&addr("0xB")).await.unwrap_err();
        assert_eq!(err.message(), "header not found");
        gw.clear_read_failures();
        assert!(gw.has_voted(&addr("0xB")).await.is_ok());

        gw.fail_next_write("user rejected transaction");
        let err = gw.toggle_election(&addr("0xA")).await.unwrap_err();
        assert_eq!(err.message(), "user rejected transaction");
        assert!(!gw.is_open(), "failed write leaves state untouched");
    }

    #[tokio::test]
    async fn paused_reads_wait_for_resume() {
        let gw = Arc::new(NullGateway::new(addr("0xA")));
        gw.pause_reads(ContractMethod::ElectionOpen);

        let reader = {
            let gw = Arc::clone(&gw);
            tokio::spawn(async move { gw.election_open().await })
        };
        while gw.blocked_reads() == 0 {
            tokio::task::yield_now().await;
        }
        gw.seed_open(true);
        gw.resume_reads();

        assert!(reader.await.unwrap().unwrap());
        assert_eq!(gw.blocked_reads(), 0);
    }
}
