use ballot_gateway::{ContractGateway, ContractMethod, GatewayError, TxReceipt};
use ballot_types::{Address, Candidate, ElectionPhase, Epoch, VoterStatus};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::candidates::read_candidates;
use crate::error::{Precondition, SyncError};
use crate::signals::{ElectionSignal, SyncSignals};
use crate::view::{Audience, ViewState};

/// Why a refresh was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// First load of a view.
    Initial,
    /// The view was rebound to another identity or gateway.
    IdentityChanged,
    /// Another view announced a phase change.
    PhaseChanged(ElectionPhase),
    /// A reset advanced the epoch.
    EpochAdvanced(Epoch),
    /// A write by this view succeeded.
    AfterWrite(ContractMethod),
    /// Explicit user request.
    Manual,
}

impl fmt::Display for RefreshTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::IdentityChanged => write!(f, "identity-changed"),
            Self::PhaseChanged(phase) => write!(f, "phase-changed({phase})"),
            Self::EpochAdvanced(epoch) => write!(f, "epoch-advanced({})", epoch.0),
            Self::AfterWrite(method) => write!(f, "after-write({})", method.name()),
            Self::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The refresh completed and its view is now displayed.
    Published(ViewState),
    /// A newer refresh started before this one finished; its result was
    /// discarded.
    Superseded,
}

impl RefreshOutcome {
    pub fn view(&self) -> Option<&ViewState> {
        match self {
            Self::Published(view) => Some(view),
            Self::Superseded => None,
        }
    }
}

struct Binding {
    gateway: Arc<dyn ContractGateway>,
    identity: Address,
}

/// Whether the election was observed open in the tracked epoch.
#[derive(Default)]
struct PhaseTracker {
    epoch: Epoch,
    seen_open: bool,
}

impl PhaseTracker {
    fn observe(&mut self, epoch: Epoch, open: bool) -> bool {
        if epoch != self.epoch {
            *self = Self {
                epoch,
                seen_open: false,
            };
        }
        self.seen_open |= open;
        self.seen_open
    }
}

struct Snapshot {
    election_open: bool,
    status: VoterStatus,
    candidates: Vec<Candidate>,
}

/// Keeps one dashboard's [`ViewState`] in step with the contract.
pub struct Synchronizer {
    audience: Audience,
    binding: RwLock<Binding>,
    signals: SyncSignals,
    generation: AtomicU64,
    tracker: Mutex<PhaseTracker>,
    view: watch::Sender<ViewState>,
}

impl Synchronizer {
    pub fn new(
        gateway: Arc<dyn ContractGateway>,
        identity: Address,
        audience: Audience,
        signals: SyncSignals,
    ) -> Self {
        let epoch = signals.epoch();
        let (view, _) = watch::channel(ViewState::initial(epoch, audience));
        Self {
            audience,
            binding: RwLock::new(Binding { gateway, identity }),
            signals,
            generation: AtomicU64::new(0),
            tracker: Mutex::new(PhaseTracker {
                epoch,
                seen_open: false,
            }),
            view,
        }
    }

    pub fn audience(&self) -> Audience {
        self.audience
    }

    pub fn identity(&self) -> Address {
        self.read_binding().1
    }

    pub fn signals(&self) -> &SyncSignals {
        &self.signals
    }

    /// The currently displayed view.
    pub fn view(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    fn read_binding(&self) -> (Arc<dyn ContractGateway>, Address) {
        let binding = self.binding.read().unwrap_or_else(|e| e.into_inner());
        (Arc::clone(&binding.gateway), binding.identity.clone())
    }

    /// Point the view at another identity (or gateway) and reload.
    pub async fn rebind(
        &self,
        gateway: Arc<dyn ContractGateway>,
        identity: Address,
    ) -> Result<RefreshOutcome, SyncError> {
        {
            let mut binding = self.binding.write().unwrap_or_else(|e| e.into_inner());
            *binding = Binding { gateway, identity };
        }
        self.view
            .send_replace(ViewState::initial(self.signals.epoch(), self.audience));
        self.refresh(RefreshTrigger::IdentityChanged).await
    }

    /// Re-read the full snapshot and publish it, unless a newer refresh
    /// started in the meantime.
    ///
    /// On a failed read nothing is published and the previous view stays.
    pub async fn refresh(&self, trigger: RefreshTrigger) -> Result<RefreshOutcome, SyncError> {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = self.signals.epoch();
        let (gateway, identity) = self.read_binding();
        debug!(audience = %self.audience, %trigger, token, "refresh started");

        let snapshot = self
            .read_snapshot(gateway, &identity)
            .await
            .map_err(|e| {
                warn!(audience = %self.audience, %trigger, token, "refresh failed: {e}");
                SyncError::Read(e)
            })?;

        let announced = self.signals.current();
        let mut published = None;
        self.view.send_if_modified(|current| {
            // Checked under the channel lock so that a superseded refresh can
            // never overwrite the result of a newer one.
            if self.generation.load(Ordering::SeqCst) != token || announced.epoch != epoch {
                return false;
            }
            let view = self.derive_view(epoch, announced, snapshot);
            let changed = *current != view;
            *current = view.clone();
            published = Some(view);
            changed
        });

        match published {
            Some(view) => {
                debug!(
                    audience = %self.audience,
                    token,
                    phase = %view.phase,
                    candidates = view.candidates.len(),
                    "refresh published"
                );
                Ok(RefreshOutcome::Published(view))
            }
            None => {
                debug!(audience = %self.audience, %trigger, token, "refresh superseded");
                Ok(RefreshOutcome::Superseded)
            }
        }
    }

    async fn read_snapshot(
        &self,
        gateway: Arc<dyn ContractGateway>,
        identity: &Address,
    ) -> Result<Snapshot, GatewayError> {
        match self.audience {
            Audience::Voter => {
                let (election_open, is_authorized, has_voted, candidates) = tokio::try_join!(
                    gateway.election_open(),
                    gateway.is_authorized(identity),
                    gateway.has_voted(identity),
                    read_candidates(Arc::clone(&gateway)),
                )?;
                Ok(Snapshot {
                    election_open,
                    status: VoterStatus {
                        is_authorized,
                        has_voted,
                    },
                    candidates,
                })
            }
            Audience::Admin => {
                let (election_open, candidates) = tokio::try_join!(
                    gateway.election_open(),
                    read_candidates(Arc::clone(&gateway)),
                )?;
                Ok(Snapshot {
                    election_open,
                    status: VoterStatus::default(),
                    candidates,
                })
            }
        }
    }

    fn derive_view(&self, epoch: Epoch, announced: ElectionSignal, snapshot: Snapshot) -> ViewState {
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        let seen_open = tracker.observe(epoch, snapshot.election_open)
            || announced.phase != ElectionPhase::NotStarted;
        let any_votes = snapshot.candidates.iter().any(|c| c.vote_count > 0);
        let phase = ElectionPhase::derive(snapshot.election_open, seen_open, any_votes);
        ViewState::derive(epoch, self.audience, phase, snapshot.status, snapshot.candidates)
    }

    /// Refresh whenever a toggle or an epoch advance is announced, until
    /// `shutdown` fires.
    pub fn watch_triggers(self: &Arc<Self>, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        let sync = Arc::clone(self);
        let mut signals = self.signals.subscribe();

        tokio::spawn(async move {
            let mut toggles = signals.borrow_and_update().toggles;
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    changed = signals.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                let signal = *signals.borrow_and_update();
                let toggled = signal.toggles != toggles;
                toggles = signal.toggles;
                let shown = sync.view();
                let trigger = if signal.epoch != shown.epoch {
                    sync.view
                        .send_replace(ViewState::initial(signal.epoch, sync.audience));
                    RefreshTrigger::EpochAdvanced(signal.epoch)
                } else if toggled || signal.phase != shown.phase {
                    RefreshTrigger::PhaseChanged(signal.phase)
                } else {
                    continue;
                };

                if let Err(e) = sync.refresh(trigger).await {
                    warn!(audience = %sync.audience, %trigger, "triggered refresh failed: {e}");
                }
            }
            debug!(audience = %sync.audience, "trigger watcher stopped");
        })
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Cast the identity's ballot.
    pub async fn cast_vote(&self, candidate_id: Option<u64>) -> Result<TxReceipt, SyncError> {
        let view = self.view();
        let id = candidate_id.ok_or(Precondition::NoCandidateSelected)?;
        if !view.is_authorized {
            return Err(Precondition::NotAuthorized.into());
        }
        if view.has_voted {
            return Err(Precondition::AlreadyVoted.into());
        }
        if !view.phase.is_open() {
            return Err(Precondition::ElectionNotOpen.into());
        }
        if view.candidate(id).is_none() {
            return Err(Precondition::UnknownCandidate(id).into());
        }

        let (gateway, identity) = self.read_binding();
        let receipt = gateway
            .vote(&identity, id)
            .await
            .map_err(|e| self.write_failed(ContractMethod::Vote, e))?;
        info!(%identity, candidate = id, tx = %receipt.transaction_hash, "vote cast");

        self.refresh_after(ContractMethod::Vote).await;
        Ok(receipt)
    }

    /// Authorize `voter` to cast one ballot.
    pub async fn authorize_voter(&self, voter: &str) -> Result<TxReceipt, SyncError> {
        self.require_admin()?;
        let voter = voter.trim();
        if voter.is_empty() {
            return Err(Precondition::EmptyInput("voter address").into());
        }
        let voter = Address::parse(voter).map_err(|_| Precondition::InvalidAddress(voter.to_string()))?;

        let (gateway, identity) = self.read_binding();
        let receipt = gateway
            .add_voter(&identity, &voter)
            .await
            .map_err(|e| self.write_failed(ContractMethod::AddVoter, e))?;
        info!(%voter, tx = %receipt.transaction_hash, "voter authorized");

        self.refresh_after(ContractMethod::AddVoter).await;
        Ok(receipt)
    }

    pub async fn add_candidate(&self, name: &str) -> Result<TxReceipt, SyncError> {
        self.require_admin()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Precondition::EmptyInput("candidate name").into());
        }

        let (gateway, identity) = self.read_binding();
        let receipt = gateway
            .add_candidate(&identity, name)
            .await
            .map_err(|e| self.write_failed(ContractMethod::AddCandidate, e))?;
        info!(candidate = name, tx = %receipt.transaction_hash, "candidate added");

        self.refresh_after(ContractMethod::AddCandidate).await;
        Ok(receipt)
    }

    /// Start or end the election, then announce the new phase.
    pub async fn toggle_election_phase(&self) -> Result<TxReceipt, SyncError> {
        self.require_admin()?;
        let mut view = self.view();
        if !view.phase.is_open() && view.candidates.is_empty() {
            // Candidates may have been added since this view last loaded.
            if let RefreshOutcome::Published(fresh) = self.refresh(RefreshTrigger::Manual).await? {
                view = fresh;
            }
            if !view.phase.is_open() && view.candidates.is_empty() {
                return Err(Precondition::NoCandidates.into());
            }
        }

        let (gateway, identity) = self.read_binding();
        let receipt = gateway
            .toggle_election(&identity)
            .await
            .map_err(|e| self.write_failed(ContractMethod::ToggleElection, e))?;

        // Either the toggle opened the election or it was open until now.
        self.tracker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .observe(view.epoch, true);

        // The contract decides the new phase; the cached view may be stale.
        let phase = match self.refresh_after(ContractMethod::ToggleElection).await {
            Some(fresh) => fresh.phase,
            None if view.phase.is_open() => ElectionPhase::Closed,
            None => ElectionPhase::Open,
        };
        info!(%phase, tx = %receipt.transaction_hash, "election toggled");
        self.signals.publish_phase(phase);
        Ok(receipt)
    }

    /// Wipe candidates, voters and votes, starting a new epoch.
    pub async fn reset_election(&self) -> Result<TxReceipt, SyncError> {
        self.require_admin()?;
        let view = self.view();
        if view.phase.is_open() {
            return Err(Precondition::ResetWhileOpen.into());
        }

        let (gateway, identity) = self.read_binding();
        let receipt = gateway
            .reset_election(&identity)
            .await
            .map_err(|e| self.write_failed(ContractMethod::ResetElection, e))?;

        let epoch = self.signals.advance_epoch();
        self.view.send_replace(ViewState::initial(epoch, self.audience));
        info!(epoch = epoch.0, tx = %receipt.transaction_hash, "election reset");

        self.refresh_after(ContractMethod::ResetElection).await;
        Ok(receipt)
    }

    fn require_admin(&self) -> Result<(), Precondition> {
        match self.audience {
            Audience::Admin => Ok(()),
            Audience::Voter => Err(Precondition::AdminOnly),
        }
    }

    fn write_failed(&self, method: ContractMethod, e: GatewayError) -> SyncError {
        warn!(method = method.name(), audience = %self.audience, "write failed: {e}");
        SyncError::Write(e)
    }

    /// A successful write is reported even if the follow-up read fails; the
    /// next trigger will catch up. Returns the view if this refresh
    /// published it.
    async fn refresh_after(&self, method: ContractMethod) -> Option<ViewState> {
        match self.refresh(RefreshTrigger::AfterWrite(method)).await {
            Ok(RefreshOutcome::Published(view)) => Some(view),
            Ok(RefreshOutcome::Superseded) => None,
            Err(e) => {
                warn!(method = method.name(), "refresh after write failed: {e}");
                None
            }
        }
    }
}
