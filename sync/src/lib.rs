//! Election view-state synchronizer.
//!
//! A [`Synchronizer`] keeps one dashboard's [`ViewState`] consistent with the
//! contract. Every refresh re-reads the full snapshot; nothing is patched
//! locally. Refreshes are stamped with a generation token and only the most
//! recently started one may publish. Views coordinate through
//! [`SyncSignals`]: an admin's toggle broadcasts the new phase and a reset
//! advances the epoch, and every subscribed view refreshes in response.

pub mod actions;
pub mod candidates;
pub mod error;
pub mod signals;
pub mod synchronizer;
pub mod view;

pub use actions::AdminAction;
pub use candidates::{candidate_stream, read_candidates};
pub use error::{Precondition, SyncError};
pub use signals::{ElectionSignal, SyncSignals};
pub use synchronizer::{RefreshOutcome, RefreshTrigger, Synchronizer};
pub use view::{Audience, ViewState};
