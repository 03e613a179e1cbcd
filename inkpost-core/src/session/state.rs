//! Session state record

use crate::identity::Identity;
use crate::roles::{Role, RoleSet};

/// Where the session pipeline is for the current identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No identity emission processed yet
    #[default]
    Starting,
    /// Identity present, role fetch in flight
    RolesLoading,
    /// Identity present, roles loaded (or defaulted)
    Ready,
    /// No identity; nothing to load
    SignedOut,
}

/// Process-wide session record, replaced wholesale on every update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    roles: RoleSet,
    phase: SessionPhase,
    generation: u64,
}

impl SessionState {
    pub(crate) fn loading(identity: Identity, generation: u64) -> Self {
        Self {
            identity: Some(identity),
            roles: RoleSet::new(),
            phase: SessionPhase::RolesLoading,
            generation,
        }
    }

    pub(crate) fn ready(identity: Identity, roles: RoleSet, generation: u64) -> Self {
        Self { identity: Some(identity), roles, phase: SessionPhase::Ready, generation }
    }

    pub(crate) fn signed_out(generation: u64) -> Self {
        Self { identity: None, roles: RoleSet::new(), phase: SessionPhase::SignedOut, generation }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Roles of the current identity; empty while loading and when signed out
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// True once the pipeline has settled for the current identity
    pub fn roles_ready(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready | SessionPhase::SignedOut)
    }

    /// Number of identity emissions applied so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Whether the session holds `role`. Signed-out sessions hold no roles.
pub fn has_role(session: &SessionState, role: &str) -> bool {
    session.identity.is_some() && session.roles.contains(role)
}

pub fn is_admin(session: &SessionState) -> bool {
    has_role(session, Role::ADMIN)
}

pub fn is_editor(session: &SessionState) -> bool {
    has_role(session, Role::EDITOR)
}

pub fn is_moderator(session: &SessionState) -> bool {
    has_role(session, Role::MODERATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_not_ready() {
        let state = SessionState::default();
        assert_eq!(state.phase(), SessionPhase::Starting);
        assert!(!state.roles_ready());
        assert!(!state.is_authenticated());
        assert!(state.roles().is_empty());
    }

    #[test]
    fn test_phase_readiness() {
        let ada = Identity::new("u1", "ada@example.com");

        let loading = SessionState::loading(ada.clone(), 1);
        assert!(!loading.roles_ready());
        assert!(loading.roles().is_empty());

        let ready = SessionState::ready(ada, RoleSet::from_iter(["user", "editor"]), 1);
        assert!(ready.roles_ready());
        assert!(is_editor(&ready));
        assert!(!is_admin(&ready));
        assert!(!is_moderator(&ready));

        let signed_out = SessionState::signed_out(2);
        assert!(signed_out.roles_ready());
        assert!(!has_role(&signed_out, Role::USER));
    }
}
