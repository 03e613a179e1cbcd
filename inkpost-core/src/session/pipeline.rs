//! Identity stream -> role fetch -> session state pipeline
//!
//! Runs as a background task for the lifetime of the [`SessionPipeline`].
//! Each emission supersedes the previous one: an in-flight role fetch is
//! aborted, and a result that still slips through is rejected by the
//! writer's generation check. Dropping the pipeline aborts the in-flight
//! fetch along with the loop.

use super::context::{SessionContext, SessionWriter};
use crate::identity::{IdentityProvider, IdentityStream};
use crate::roles::RoleStore;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Owner of the session pipeline task
///
/// # Example
///
/// ```no_run
/// use inkpost_core::identity::{MemoryIdentityProvider, PersistenceMode};
/// use inkpost_core::roles::RoleStore;
/// use inkpost_core::session::SessionPipeline;
/// use inkpost_core::store::MemoryDocumentStore;
/// use std::sync::Arc;
///
/// # async fn example() {
/// let provider = Arc::new(MemoryIdentityProvider::new(PersistenceMode::Session));
/// let roles = RoleStore::new(Arc::new(MemoryDocumentStore::new()));
/// let pipeline = SessionPipeline::spawn(provider, roles);
/// let session = pipeline.context();
/// # }
/// ```
pub struct SessionPipeline {
    context: SessionContext,
    task: Option<JoinHandle<()>>,
}

impl SessionPipeline {
    /// Subscribe to the provider and start processing emissions
    pub fn spawn(provider: Arc<dyn IdentityProvider>, role_store: RoleStore) -> Self {
        Self::from_stream(provider.observe_identity(), role_store)
    }

    /// Start processing an existing identity stream
    pub fn from_stream(stream: IdentityStream, role_store: RoleStore) -> Self {
        let (writer, context) = SessionContext::tracking(stream.emissions());
        let task = tokio::spawn(run(stream, Arc::new(writer), role_store));
        Self { context, task: Some(task) }
    }

    /// Read handle on the session state
    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }
}

impl Drop for SessionPipeline {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Role fetch task, aborted when dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run(mut stream: IdentityStream, writer: Arc<SessionWriter>, role_store: RoleStore) {
    let mut in_flight: Option<AbortOnDrop> = None;

    while let Some(emission) = stream.next().await {
        // Dropping the previous fetch aborts it
        in_flight = None;

        match emission {
            Some(identity) => {
                log::debug!("Identity emitted: {}", identity.email);
                let generation = writer.begin_loading(identity.clone());
                let writer = Arc::clone(&writer);
                let role_store = role_store.clone();
                in_flight = Some(AbortOnDrop(tokio::spawn(async move {
                    let roles = role_store.fetch_roles(&identity).await;
                    if !writer.complete(generation, roles) {
                        log::debug!("Discarded stale roles for {}", identity.email);
                    }
                })));
            }
            None => {
                log::debug!("Identity emitted: signed out");
                writer.sign_out();
            }
        }
    }

    // Let the last fetch finish so the state still settles
    if let Some(mut fetch) = in_flight {
        let _ = (&mut fetch.0).await;
    }
    log::debug!("Identity stream closed");
}
