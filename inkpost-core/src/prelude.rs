//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use inkpost_core::prelude::*;
//! ```

// === Application ===
pub use crate::app::{InkpostApp, InkpostAppBuilder};

// === Configuration and logging ===
pub use crate::config::{AuthConfig, GuardConfig, InkpostConfig, LoggingConfig, RolesConfig};
pub use crate::logging::init_logging;

// === Identity and roles ===
pub use crate::identity::{
    Identity, IdentityProvider, IdentityStream, MemoryIdentityProvider, PersistenceMode,
};
pub use crate::roles::{Role, RoleSet, RoleStore};

// === Session ===
pub use crate::session::{
    has_role, is_admin, is_editor, is_moderator, SessionContext, SessionPhase, SessionPipeline,
    SessionState,
};

// === Navigation ===
pub use crate::router::{
    ForbiddenNotice, LogNotifier, NavigationDenied, NavigationGuard, NavigationOutcome, Notifier,
    RouteRequirement, RouteTable,
};

// === Persistence ===
pub use crate::blog::{CategoryRepository, PostRepository, UserRepository};
pub use crate::store::{Collection, Document, DocumentStore, MemoryDocumentStore, Query};

// === Errors ===
pub use crate::error::{AuthError, BlogError, StoreError};
