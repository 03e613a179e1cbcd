//! End-to-end navigation scenarios
//!
//! Each test boots the full stack (provider, store, role store, session
//! pipeline, guard) and drives it only through public APIs.

use async_trait::async_trait;
use inkpost_core::error::StoreResult;
use inkpost_core::prelude::*;
use inkpost_core::router::RecordingNotifier;
use inkpost_core::store::StoredDocument;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Store whose reads wait for a permit before reaching the inner store
struct GatedStore {
    inner: MemoryDocumentStore,
    gate: Arc<Semaphore>,
}

impl GatedStore {
    fn closed() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self { inner: MemoryDocumentStore::new(), gate: gate.clone() }, gate)
    }
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn create(&self, collection: &str, data: Document) -> StoreResult<String> {
        self.inner.create(collection, data).await
    }
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let _permit = self.gate.acquire().await.map_err(|_| StoreError::Unavailable("closed".into()))?;
        self.inner.get(collection, id).await
    }
    async fn set(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.inner.set(collection, id, data).await
    }
    async fn update(&self, collection: &str, id: &str, data: Document) -> StoreResult<()> {
        self.inner.update(collection, id, data).await
    }
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id).await
    }
    async fn query(&self, collection: &str, query: Query) -> StoreResult<Vec<StoredDocument>> {
        self.inner.query(collection, query).await
    }
}

struct Harness {
    app: InkpostApp,
    provider: Arc<MemoryIdentityProvider>,
    notifier: RecordingNotifier,
}

fn config() -> InkpostConfig {
    let mut config = InkpostConfig::default();
    config.auth.persistence = PersistenceMode::Session;
    config
}

fn harness_with_store(store: Arc<dyn DocumentStore>) -> Harness {
    let provider = Arc::new(MemoryIdentityProvider::new(PersistenceMode::Session));
    let notifier = RecordingNotifier::new();
    let app = InkpostAppBuilder::with_config(config())
        .with_provider(provider.clone())
        .with_store(store)
        .with_notifier(Arc::new(notifier.clone()))
        .build()
        .expect("app builds");
    Harness { app, provider, notifier }
}

fn harness() -> Harness {
    harness_with_store(Arc::new(MemoryDocumentStore::new()))
}

async fn wait_for_phase(app: &InkpostApp, phase: SessionPhase) -> SessionState {
    let mut rx = app.session().subscribe();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.phase() == phase))
        .await
        .expect("phase reached in time")
        .expect("pipeline alive")
        .clone();
    state
}

#[tokio::test]
async fn anonymous_user_is_sent_to_login() {
    let h = harness();

    let outcome = h.app.navigate("/dashboard").await;
    assert_eq!(outcome.destination(), "/auth/login");
    assert_eq!(outcome.reason(), Some(&NavigationDenied::Unauthenticated));

    let outcome = h.app.navigate("/create-post").await;
    assert_eq!(outcome.reason(), Some(&NavigationDenied::Unauthenticated));

    assert!(h.app.navigate("/blog/first-post").await.is_allowed());
}

#[tokio::test]
async fn plain_user_is_forbidden_from_dashboard() {
    let h = harness();
    h.provider.sign_up("ada@example.com", "secret-pw").await.unwrap();
    let state = wait_for_phase(&h.app, SessionPhase::Ready).await;
    assert_eq!(state.roles(), &RoleSet::default_user());

    let outcome = h.app.navigate("/dashboard").await;
    assert_eq!(
        outcome,
        NavigationOutcome::Redirect {
            from: "/dashboard".into(),
            to: "/".into(),
            reason: NavigationDenied::Forbidden { role: Role::ADMIN.into() },
        }
    );

    let notices = h.notifier.drain();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].role, "admin");

    // Authenticated pages without a role requirement stay open
    assert!(h.app.navigate("/create-post").await.is_allowed());
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn admin_reaches_dashboard() {
    let h = harness();
    let identity = h.provider.register_account("root@example.com", "secret-pw").unwrap();
    h.app
        .users()
        .create_user_document(&identity, vec![Role::USER.into(), Role::ADMIN.into()])
        .await
        .unwrap();

    h.provider.sign_in("root@example.com", "secret-pw").await.unwrap();
    let state = wait_for_phase(&h.app, SessionPhase::Ready).await;
    assert!(is_admin(&state));

    for path in ["/dashboard", "/dashboard/categories/new", "/dashboard/users"] {
        assert!(h.app.navigate(path).await.is_allowed(), "{} should be allowed", path);
    }
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn signed_in_user_is_sent_home_from_login() {
    let h = harness();
    h.provider.sign_up("ada@example.com", "secret-pw").await.unwrap();
    wait_for_phase(&h.app, SessionPhase::Ready).await;

    let outcome = h.app.navigate("/auth/login").await;
    assert_eq!(outcome.destination(), "/");
    assert_eq!(outcome.reason(), Some(&NavigationDenied::AlreadySignedIn));

    // Once signed out the login page opens again
    h.provider.sign_out().await.unwrap();
    wait_for_phase(&h.app, SessionPhase::SignedOut).await;
    assert!(h.app.navigate("/auth/login").await.is_allowed());
}

#[tokio::test(start_paused = true)]
async fn stalled_role_fetch_times_out_as_signed_out() {
    let (store, _gate) = GatedStore::closed();
    let h = harness_with_store(Arc::new(store));

    h.provider.sign_up("ada@example.com", "secret-pw").await.unwrap();
    wait_for_phase(&h.app, SessionPhase::RolesLoading).await;

    let started = tokio::time::Instant::now();
    let outcome = h.app.navigate("/dashboard").await;
    assert_eq!(outcome.destination(), "/auth/login");
    assert_eq!(outcome.reason(), Some(&NavigationDenied::ReadinessTimeout));
    assert!(started.elapsed() >= Duration::from_millis(1000));

    assert!(h.app.navigate("/about").await.is_allowed());
}

#[tokio::test]
async fn sign_out_discards_in_flight_roles() {
    let (store, gate) = GatedStore::closed();
    let store = Arc::new(store);
    let h = harness_with_store(store.clone());

    let identity = h.provider.register_account("root@example.com", "secret-pw").unwrap();
    h.app.users().create_user_document(&identity, vec!["admin".into()]).await.unwrap();

    h.provider.sign_in("root@example.com", "secret-pw").await.unwrap();
    wait_for_phase(&h.app, SessionPhase::RolesLoading).await;

    h.provider.sign_out().await.unwrap();
    let state = wait_for_phase(&h.app, SessionPhase::SignedOut).await;

    // Let the old fetch run to completion if it was not cancelled
    gate.add_permits(10);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let current = h.app.session().snapshot();
    assert_eq!(current, state);
    assert!(current.identity().is_none());
    assert!(current.roles().is_empty());
    assert!(!is_admin(&current));

    let outcome = h.app.navigate("/dashboard").await;
    assert_eq!(outcome.reason(), Some(&NavigationDenied::Unauthenticated));
}

#[tokio::test]
async fn latest_identity_wins() {
    let h = harness();
    let admin = h.provider.register_account("root@example.com", "secret-pw").unwrap();
    h.app.users().create_user_document(&admin, vec!["user".into(), "admin".into()]).await.unwrap();

    h.provider.sign_in("root@example.com", "secret-pw").await.unwrap();
    h.provider.sign_out().await.unwrap();
    h.provider.sign_up("ada@example.com", "secret-pw").await.unwrap();

    let mut rx = h.app.session().subscribe();
    let state = rx
        .wait_for(|s| {
            s.phase() == SessionPhase::Ready
                && s.identity().map(|i| i.email.as_str()) == Some("ada@example.com")
        })
        .await
        .unwrap()
        .clone();
    assert_eq!(state.roles(), &RoleSet::default_user());
    assert_eq!(
        h.app.navigate("/dashboard").await.reason(),
        Some(&NavigationDenied::Forbidden { role: "admin".into() })
    );
}

#[tokio::test]
async fn navigation_right_after_sign_out_sees_signed_out() {
    let h = harness();
    let identity = h.provider.register_account("root@example.com", "secret-pw").unwrap();
    h.app
        .users()
        .create_user_document(&identity, vec![Role::USER.into(), Role::ADMIN.into()])
        .await
        .unwrap();
    h.provider.sign_in("root@example.com", "secret-pw").await.unwrap();
    assert!(h.app.navigate("/dashboard/users").await.is_allowed());

    // No waiting on the session between the sign-out and the navigation
    h.provider.sign_out().await.unwrap();
    let outcome = h.app.navigate("/dashboard/users").await;
    assert_eq!(
        outcome,
        NavigationOutcome::Redirect {
            from: "/dashboard/users".into(),
            to: "/auth/login".into(),
            reason: NavigationDenied::Unauthenticated,
        }
    );
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn navigation_right_after_sign_up_sees_new_user() {
    let h = harness();
    assert_eq!(
        h.app.navigate("/create-post").await.reason(),
        Some(&NavigationDenied::Unauthenticated)
    );

    h.provider.sign_up("ada@example.com", "secret-pw").await.unwrap();
    let outcome = h.app.navigate("/create-post").await;
    assert!(outcome.is_allowed(), "got {}", outcome);

    let state = h.app.session().snapshot();
    assert_eq!(state.identity().map(|i| i.email.as_str()), Some("ada@example.com"));
    assert_eq!(state.roles(), &RoleSet::default_user());
}

#[tokio::test]
async fn navigation_right_after_sign_in_sees_admin_roles() {
    let h = harness();
    let plain = h.provider.register_account("ada@example.com", "secret-pw").unwrap();
    let admin = h.provider.register_account("root@example.com", "secret-pw").unwrap();
    h.app.users().create_user_document(&plain, vec![Role::USER.into()]).await.unwrap();
    h.app
        .users()
        .create_user_document(&admin, vec![Role::USER.into(), Role::ADMIN.into()])
        .await
        .unwrap();

    h.provider.sign_in("ada@example.com", "secret-pw").await.unwrap();
    assert_eq!(
        h.app.navigate("/dashboard").await.reason(),
        Some(&NavigationDenied::Forbidden { role: Role::ADMIN.into() })
    );

    h.provider.sign_out().await.unwrap();
    h.provider.sign_in("root@example.com", "secret-pw").await.unwrap();
    assert!(h.app.navigate("/dashboard").await.is_allowed());
}
