//! Role sets and the role store
//!
//! Every identity has a role record in the `users` collection. The first
//! lookup for a new identity creates one with the default roles. Lookup
//! failures never reach the caller: they are logged and the default
//! (least-privileged) role set is returned instead.
//!
//! Record creation is a plain read-then-write. Two concurrent first logins for
//! the same uid both write the same default record, so last-writer-wins is
//! harmless here.

use crate::blog::UserDoc;
use crate::error::{RoleFetchError, StoreError};
use crate::identity::Identity;
use crate::store::{to_document, Collection, DocumentStore};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Well-known role tags
pub struct Role;

impl Role {
    pub const USER: &'static str = "user";
    pub const ADMIN: &'static str = "admin";
    pub const EDITOR: &'static str = "editor";
    pub const MODERATOR: &'static str = "moderator";
}

/// Set of role tags held by an identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The least-privileged set: `{"user"}`
    pub fn default_user() -> Self {
        Self::from_iter([Role::USER])
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    pub fn insert(&mut self, role: impl Into<String>) -> bool {
        self.0.insert(role.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.to_vec().join(", "))
    }
}

/// Fetches (and on first login creates) role records
#[derive(Clone)]
pub struct RoleStore {
    store: Arc<dyn DocumentStore>,
    default_roles: RoleSet,
}

impl RoleStore {
    /// Role store granting `{"user"}` by default
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, default_roles: RoleSet::default_user() }
    }

    /// Override the default role set
    pub fn with_default_roles(mut self, roles: RoleSet) -> Self {
        if roles.is_empty() {
            log::warn!("Ignoring empty default role set");
        } else {
            self.default_roles = roles;
        }
        self
    }

    pub fn default_roles(&self) -> &RoleSet {
        &self.default_roles
    }

    /// Roles for an identity. Never fails: errors degrade to the default set.
    pub async fn fetch_roles(&self, identity: &Identity) -> RoleSet {
        match self.try_fetch_roles(identity).await {
            Ok(roles) => {
                log::debug!("Roles for {}: {}", identity.email, roles);
                roles
            }
            Err(e) => {
                log::error!("Role fetch failed, falling back to {}: {}", self.default_roles, e);
                self.default_roles.clone()
            }
        }
    }

    async fn try_fetch_roles(&self, identity: &Identity) -> Result<RoleSet, RoleFetchError> {
        let uid = &identity.uid;
        let existing = self
            .store
            .get(Collection::USERS, uid)
            .await
            .map_err(|source| RoleFetchError::Lookup { uid: uid.clone(), source })?;

        match existing {
            Some(record) => parse_roles(uid, record.get("roles")),
            None => {
                let doc = UserDoc::new(identity.email.clone(), self.default_roles.to_vec());
                let create = |source: StoreError| RoleFetchError::Create { uid: uid.clone(), source };
                let body = to_document(&doc).map_err(create)?;
                self.store.set(Collection::USERS, uid, body).await.map_err(create)?;
                log::info!("Created role record for {} with {}", identity.email, self.default_roles);
                Ok(self.default_roles.clone())
            }
        }
    }
}

/// A usable record holds a non-empty list of role strings
fn parse_roles(uid: &str, roles: Option<&Value>) -> Result<RoleSet, RoleFetchError> {
    let malformed = |reason: &str| RoleFetchError::Malformed {
        uid: uid.to_string(),
        reason: reason.to_string(),
    };
    let list = roles.and_then(Value::as_array).ok_or_else(|| malformed("no roles list"))?;
    let set: RoleSet = list
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    if set.is_empty() {
        return Err(malformed("empty roles list"));
    }
    Ok(set)
}
