//! Identity provider adapter
//!
//! Wraps the hosted authentication service behind [`IdentityProvider`]:
//! email/password sign-in, sign-up and sign-out, plus an ordered stream of
//! identity changes.
//!
//! # Stream contract
//!
//! [`IdentityProvider::observe_identity`] yields the restored identity (or
//! `None`) first, then one item per sign-in/sign-up/sign-out, in the order
//! those calls completed.
//!
//! # Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use inkpost_core::identity::{IdentityProvider, MemoryIdentityProvider, PersistenceMode};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = MemoryIdentityProvider::new(PersistenceMode::Session);
//! let mut changes = provider.observe_identity();
//! assert_eq!(changes.next().await, Some(None));
//!
//! provider.sign_up("ada@example.com", "analytical").await?;
//! assert!(changes.next().await.flatten().is_some());
//! # Ok(())
//! # }
//! ```

mod memory;
mod password;

pub use memory::MemoryIdentityProvider;
pub use password::{PasswordError, PasswordHasherService, Verified};

use crate::error::AuthResult;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Authenticated identity, replaced wholesale on every change
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque unique id issued by the provider
    pub uid: String,
    pub email: String,
}

impl Identity {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self { uid: uid.into(), email: email.into() }
    }
}

/// Where a signed-in session is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Survives process restart
    #[default]
    Local,
    /// Lives as long as the process
    Session,
}

impl std::str::FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(PersistenceMode::Local),
            "session" => Ok(PersistenceMode::Session),
            other => Err(format!("unknown persistence mode '{}'", other)),
        }
    }
}

impl std::fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceMode::Local => write!(f, "local"),
            PersistenceMode::Session => write!(f, "session"),
        }
    }
}

/// Number of identity emissions sent into a stream
///
/// Incremented before each send, so once a provider call has returned the
/// count already covers the emission it caused.
#[derive(Debug, Clone, Default)]
pub struct EmissionCounter(Arc<AtomicU64>);

impl EmissionCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}

/// Sending half of an [`IdentityStream`]
#[derive(Debug, Clone)]
pub struct IdentitySender {
    tx: mpsc::UnboundedSender<Option<Identity>>,
    emitted: EmissionCounter,
}

impl IdentitySender {
    pub fn send(
        &self,
        identity: Option<Identity>,
    ) -> Result<(), mpsc::error::SendError<Option<Identity>>> {
        self.emitted.0.fetch_add(1, Ordering::AcqRel);
        self.tx.send(identity).inspect_err(|_| {
            self.emitted.0.fetch_sub(1, Ordering::AcqRel);
        })
    }
}

/// Stream of identity changes (`None` = signed out)
#[derive(Debug)]
pub struct IdentityStream {
    rx: mpsc::UnboundedReceiver<Option<Identity>>,
    emitted: EmissionCounter,
}

impl IdentityStream {
    /// Build a stream and the sender feeding it (hosted SDK bridges, tests)
    pub fn channel() -> (IdentitySender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let emitted = EmissionCounter::default();
        (IdentitySender { tx, emitted: emitted.clone() }, Self { rx, emitted })
    }

    /// Emissions sent so far, including ones not yet received
    pub fn emissions(&self) -> EmissionCounter {
        self.emitted.clone()
    }
}

impl futures::Stream for IdentityStream {
    type Item = Option<Identity>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Identity provider trait
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Create an account and sign it in
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity>;

    /// Sign out. Local state is cleared even when the remote revocation fails.
    async fn sign_out(&self) -> AuthResult<()>;

    /// Subscribe to identity changes
    fn observe_identity(&self) -> IdentityStream;

    /// Identity currently signed in, if any
    fn current_identity(&self) -> Option<Identity>;

    /// Configured persistence mode
    fn persistence(&self) -> PersistenceMode;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_persistence_mode_parsing() {
        assert_eq!("local".parse::<PersistenceMode>().unwrap(), PersistenceMode::Local);
        assert_eq!("SESSION".parse::<PersistenceMode>().unwrap(), PersistenceMode::Session);
        assert!("tab".parse::<PersistenceMode>().is_err());
    }

    #[tokio::test]
    async fn test_identity_stream_channel_preserves_order() {
        let (tx, mut stream) = IdentityStream::channel();
        let ada = Identity::new("u1", "ada@example.com");

        tx.send(None).unwrap();
        tx.send(Some(ada.clone())).unwrap();
        drop(tx);

        assert_eq!(stream.next().await, Some(None));
        assert_eq!(stream.next().await, Some(Some(ada)));
        assert_eq!(stream.next().await, None);
    }

    #[test]
    fn test_emission_counter_counts_sends() {
        let (tx, stream) = IdentityStream::channel();
        let emitted = stream.emissions();
        assert_eq!(emitted.get(), 0);

        tx.send(None).unwrap();
        tx.send(Some(Identity::new("u1", "ada@example.com"))).unwrap();
        assert_eq!(emitted.get(), 2);

        // A send nobody can receive is not counted
        drop(stream);
        assert!(tx.send(None).is_err());
        assert_eq!(emitted.get(), 2);
    }
}
