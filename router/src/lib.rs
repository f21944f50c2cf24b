//! Role-gated page router.
//!
//! Three routes exist: Home, the admin dashboard and the voter dashboard.
//! Access is decided by pure predicates over the current
//! [`SessionSnapshot`](ballot_session::SessionSnapshot); a denied navigation
//! lands on Home. The router re-checks its route whenever the session
//! changes, so a disconnect or a lost admin role evicts the user.

pub mod route;
pub mod router;

pub use route::Route;
pub use router::{entry_route, Navigation, PageRouter};
