//! Session context for the voting client.
//!
//! A [`Session`] owns the wallet handshake: it acquires an identity, makes
//! sure the wallet is on the expected chain, binds a contract gateway for the
//! network's deployment and derives the identity's [`Role`](ballot_types::Role).
//! The result is published as a [`SessionSnapshot`] on a watch channel so the
//! router and synchronizers can follow connects, account switches and
//! disconnects.

pub mod error;
pub mod session;

pub use error::SessionError;
pub use session::{Connection, EventLoop, Session, SessionSnapshot, SessionStatus};
