//! Shared session context: one writer, many readers
//!
//! Backed by a `tokio::sync::watch` channel. Each update replaces the whole
//! [`SessionState`] under the channel lock, so readers never observe a
//! half-applied change.
//!
//! A context may track the [`EmissionCounter`] of the identity stream that
//! feeds its writer. [`SessionContext::wait_ready`] then also waits until
//! every emission sent so far has been applied, so a caller that has just
//! signed in or out never settles on the state from before its own change.

use super::state::{SessionPhase, SessionState};
use crate::identity::{EmissionCounter, Identity};
use crate::roles::RoleSet;
use std::time::Duration;
use tokio::sync::watch;

/// Why [`SessionContext::wait_ready`] gave up
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotReady {
    #[error("session did not settle within {0:?}")]
    Timeout(Duration),
    #[error("session pipeline stopped before settling")]
    Closed,
}

/// Read side of the session state
#[derive(Clone, Debug)]
pub struct SessionContext {
    rx: watch::Receiver<SessionState>,
    emitted: EmissionCounter,
}

impl SessionContext {
    /// Create a writer and its context, starting in the `Starting` phase
    pub fn channel() -> (SessionWriter, SessionContext) {
        Self::tracking(EmissionCounter::default())
    }

    /// Like [`channel`](Self::channel), with readiness also requiring every
    /// emission counted by `emitted` to have been applied
    pub fn tracking(emitted: EmissionCounter) -> (SessionWriter, SessionContext) {
        let (tx, rx) = watch::channel(SessionState::default());
        let context = SessionContext { rx, emitted: emitted.clone() };
        (SessionWriter { tx, emitted }, context)
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    /// Receiver notified on every update
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.rx.clone()
    }

    /// Whether `state` is settled and reflects every emission sent so far
    pub fn is_caught_up(&self, state: &SessionState) -> bool {
        state.roles_ready() && state.generation() >= self.emitted.get()
    }

    /// Wait (bounded) until the session has settled on the latest emission
    pub async fn wait_ready(&self, timeout: Duration) -> Result<SessionState, NotReady> {
        let mut rx = self.rx.clone();
        let caught_up = rx.wait_for(|s| self.is_caught_up(s));
        let result = match tokio::time::timeout(timeout, caught_up).await {
            Ok(Ok(state)) => Ok(state.clone()),
            Ok(Err(_)) => Err(NotReady::Closed),
            Err(_) => Err(NotReady::Timeout(timeout)),
        };
        result
    }
}

/// Write side of the session state
///
/// Every applied identity emission bumps the generation; role results carry the
/// generation they were fetched for and are dropped if a newer emission
/// has been applied since.
#[derive(Debug)]
pub struct SessionWriter {
    tx: watch::Sender<SessionState>,
    emitted: EmissionCounter,
}

impl SessionWriter {
    /// Identity emitted: clear roles and enter `RolesLoading`
    pub fn begin_loading(&self, identity: Identity) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = state.generation() + 1;
            *state = SessionState::loading(identity, generation);
        });
        generation
    }

    /// Roles fetched for `generation`. Returns false if the result was stale.
    pub fn complete(&self, generation: u64, roles: RoleSet) -> bool {
        self.tx.send_if_modified(|state| {
            if state.generation() != generation || state.phase() != SessionPhase::RolesLoading {
                return false;
            }
            match state.identity() {
                Some(identity) => {
                    *state = SessionState::ready(identity.clone(), roles, generation);
                    true
                }
                None => false,
            }
        })
    }

    /// Absence emitted: drop identity and roles
    pub fn sign_out(&self) {
        self.tx.send_modify(|state| {
            *state = SessionState::signed_out(state.generation() + 1);
        });
    }

    /// New read handle
    pub fn context(&self) -> SessionContext {
        SessionContext { rx: self.tx.subscribe(), emitted: self.emitted.clone() }
    }
}
