//! Error types for Inkpost
//!
//! One enum per concern. Auth errors reach the caller, role fetch errors are
//! absorbed by the role store, and navigation denials are not errors at all
//! (see [`crate::router::NavigationDenied`]).

/// Identity provider result type
pub type AuthResult<T> = Result<T, AuthError>;

/// Document store result type
pub type StoreResult<T> = Result<T, StoreError>;

/// Blog persistence result type
pub type BlogResult<T> = Result<T, BlogError>;

/// Sign-in, sign-up and sign-out failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already in use")]
    EmailAlreadyInUse,
    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Session persistence error: {0}")]
    Persistence(String),
}

/// Document store failures
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Document {collection}/{id} not found")]
    NotFound { collection: String, id: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
    }
}

/// Role lookup/creation failure. Never propagated past [`crate::roles::RoleStore`].
#[derive(thiserror::Error, Debug)]
pub enum RoleFetchError {
    #[error("Role lookup failed for {uid}: {source}")]
    Lookup {
        uid: String,
        #[source]
        source: StoreError,
    },
    #[error("Role record creation failed for {uid}: {source}")]
    Create {
        uid: String,
        #[source]
        source: StoreError,
    },
    #[error("Role record for {uid} is unusable: {reason}")]
    Malformed { uid: String, reason: String },
}

/// Blog persistence failures
#[derive(thiserror::Error, Debug)]
pub enum BlogError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },
    #[error("Invalid category color: {0}")]
    InvalidColor(String),
    #[error("Validation error: {0}")]
    Validation(String),
}
