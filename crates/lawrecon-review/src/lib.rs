//! Review orchestration for lawrecon.
//!
//! [`ReviewSession`] ties one legislation type's [`lawrecon_core::ReviewQueue`]
//! to its [`lawrecon_store::VerdictStore`] and drives the per-record cycle.

pub mod session;

pub use session::{Action, Outcome, ReviewSession, SessionError, SessionState};
