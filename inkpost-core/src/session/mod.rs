//! Session state for Inkpost
//!
//! Combines the identity stream and the role store into a single
//! [`SessionState`] record:
//!
//! - [`SessionPipeline`] owns the background task that consumes identity
//!   emissions and fetches roles
//! - [`SessionWriter`] is the only writer; last emission wins
//! - [`SessionContext`] is the cloneable read side used by the navigation
//!   guard and UI code, with a bounded [`SessionContext::wait_ready`]
//!
//! # State machine
//!
//! ```text
//! Starting --identity--> RolesLoading --roles--> Ready
//!    |                        |                    |
//!    +------absent------> SignedOut <----absent----+
//! ```
//!
//! Any identity emission re-enters `RolesLoading`.

mod context;
mod pipeline;
mod state;

pub use context::{NotReady, SessionContext, SessionWriter};
pub use pipeline::SessionPipeline;
pub use state::{has_role, is_admin, is_editor, is_moderator, SessionPhase, SessionState};
