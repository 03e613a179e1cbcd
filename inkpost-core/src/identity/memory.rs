//! In-memory identity provider
//!
//! Accounts live in memory with Argon2id password hashes. With
//! [`PersistenceMode::Local`] the signed-in identity is also written to a
//! session file so the next process can restore it.
//!
//! Argon2 work and session-file I/O run on the blocking pool, never under the
//! state lock. Hashes made at an older cost are replaced on sign-in.

use super::password::{PasswordHasherService, Verified};
use super::{Identity, IdentityProvider, IdentitySender, IdentityStream, PersistenceMode};
use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password_hash: String,
}

/// Session file contents
#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    identity: Identity,
    saved_at: DateTime<Utc>,
}

#[derive(Default)]
struct ProviderState {
    /// Keyed by lower-cased email
    accounts: HashMap<String, Account>,
    current: Option<Identity>,
    subscribers: Vec<IdentitySender>,
    offline: bool,
}

impl ProviderState {
    fn emit(&mut self, identity: Option<Identity>) {
        self.subscribers.retain(|tx| tx.send(identity.clone()).is_ok());
    }
}

/// In-memory identity provider
#[derive(Clone)]
pub struct MemoryIdentityProvider {
    state: Arc<Mutex<ProviderState>>,
    persistence: PersistenceMode,
    session_file: Option<PathBuf>,
    /// Serialises session-file writes so the file ends on the latest identity
    file_lock: Arc<tokio::sync::Mutex<()>>,
    min_password_length: usize,
    hasher: PasswordHasherService,
}

impl MemoryIdentityProvider {
    /// Create a provider with no restored session
    pub fn new(persistence: PersistenceMode) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProviderState::default())),
            persistence,
            session_file: None,
            file_lock: Arc::new(tokio::sync::Mutex::new(())),
            min_password_length: AuthConfig::default().min_password_length,
            hasher: PasswordHasherService::new(),
        }
    }

    /// Create a provider from configuration, restoring a persisted session
    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        let mut provider = Self::new(config.persistence);
        provider.min_password_length = config.min_password_length;
        if config.persistence == PersistenceMode::Local {
            provider = provider.with_session_file(&config.session_file)?;
        }
        Ok(provider)
    }

    /// Keep the signed-in identity in `path`, restoring it if present
    pub fn with_session_file(mut self, path: impl AsRef<Path>) -> AuthResult<Self> {
        let path = path.as_ref().to_path_buf();
        let restored = read_session_file(&path)?;
        if let Some(identity) = &restored {
            log::info!("Restored session for {}", identity.email);
        }
        self.lock().current = restored;
        self.session_file = Some(path);
        Ok(self)
    }

    /// Set the minimum accepted password length
    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    /// Hash new and upgraded passwords with `hasher`
    pub fn with_hasher(mut self, hasher: PasswordHasherService) -> Self {
        self.hasher = hasher;
        self
    }

    /// Provision an account without signing it in
    ///
    /// Hashes on the calling thread; meant for seeding before the runtime is busy.
    pub fn register_account(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let email = self.check_new_account(email, password)?;
        let password_hash = self
            .hasher
            .hash_password(password)
            .map_err(|e| AuthError::Persistence(e.to_string()))?;
        self.insert_account(new_account(email, password_hash))
    }

    /// Simulate losing (or regaining) the connection to the auth service
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().expect("identity provider lock poisoned")
    }

    /// Validate sign-up input, returning the trimmed email
    fn check_new_account<'a>(&self, email: &'a str, password: &str) -> AuthResult<&'a str> {
        let email = email.trim();
        validate_email(email)?;
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword { min_length: self.min_password_length });
        }
        Ok(email)
    }

    fn insert_account(&self, account: Account) -> AuthResult<Identity> {
        let mut state = self.lock();
        let key = account.email.to_lowercase();
        if state.accounts.contains_key(&key) {
            return Err(AuthError::EmailAlreadyInUse);
        }
        let identity = Identity::new(account.uid.clone(), account.email.clone());
        state.accounts.insert(key, account);
        Ok(identity)
    }

    /// Run Argon2 work on the blocking pool
    async fn hash_blocking<T, F>(&self, work: F) -> AuthResult<T>
    where
        T: Send + 'static,
        F: FnOnce(PasswordHasherService) -> AuthResult<T> + Send + 'static,
    {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || work(hasher))
            .await
            .map_err(|e| AuthError::Persistence(format!("password task failed: {}", e)))?
    }

    /// Bring the session file in line with the current identity
    ///
    /// Called after the state lock is released. The identity is re-read under
    /// the file lock, so overlapping calls leave the latest identity on disk.
    async fn persist_current(&self) {
        let Some(path) = self.session_file.clone() else {
            return;
        };
        let _file = self.file_lock.lock().await;
        let identity = self.lock().current.clone();

        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || match identity {
            Some(identity) => write_session_file(&target, &identity),
            None => remove_session_file(&target),
        })
        .await
        .map_err(anyhow::Error::from)
        .and_then(|written| written);
        if let Err(e) = result {
            log::warn!("Failed to update session file {}: {:#}", path.display(), e);
        }
    }
}

fn new_account(email: &str, password_hash: String) -> Account {
    Account { uid: Uuid::new_v4().simple().to_string(), email: email.to_string(), password_hash }
}

/// Replace the current identity and notify subscribers, in one critical section
fn switch_to(state: &mut ProviderState, identity: Option<Identity>) {
    state.current = identity.clone();
    state.emit(identity);
}

fn validate_email(email: &str) -> AuthResult<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

fn read_session_file(path: &Path) -> AuthResult<Option<Identity>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AuthError::Persistence(format!("{}: {}", path.display(), e)));
        }
    };
    match serde_json::from_str::<PersistedSession>(&content) {
        Ok(session) => Ok(Some(session.identity)),
        Err(e) => {
            log::warn!("Ignoring unreadable session file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn write_session_file(path: &Path, identity: &Identity) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let session = PersistedSession { identity: identity.clone(), saved_at: Utc::now() };
    std::fs::write(path, serde_json::to_vec_pretty(&session)?)?;
    Ok(())
}

fn remove_session_file(path: &Path) -> anyhow::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Identity> {
        let account = {
            let state = self.lock();
            if state.offline {
                return Err(AuthError::Network("auth service unreachable".to_string()));
            }
            state.accounts.get(&email.trim().to_lowercase()).cloned()
        };
        let account = account.ok_or(AuthError::InvalidCredentials)?;

        let password = password.to_string();
        let stored_hash = account.password_hash.clone();
        let Verified { upgraded } = self
            .hash_blocking(move |hasher| {
                hasher
                    .verify_and_upgrade(&password, &stored_hash)
                    .map_err(|_| AuthError::InvalidCredentials)?
                    .ok_or(AuthError::InvalidCredentials)
            })
            .await?;

        let identity = Identity::new(account.uid.clone(), account.email.clone());
        {
            let mut state = self.lock();
            if let Some(new_hash) = upgraded {
                let key = account.email.to_lowercase();
                // Skip if the account was replaced while verifying
                if let Some(stored) = state.accounts.get_mut(&key).filter(|a| a.uid == account.uid) {
                    stored.password_hash = new_hash;
                    log::info!("Upgraded password hash for {}", account.email);
                }
            }
            switch_to(&mut state, Some(identity.clone()));
        }
        self.persist_current().await;
        log::debug!("Signed in {}", identity.email);
        Ok(identity)
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<Identity> {
        if self.lock().offline {
            return Err(AuthError::Network("auth service unreachable".to_string()));
        }
        let email = self.check_new_account(email, password)?.to_string();
        let password = password.to_string();
        let password_hash = self
            .hash_blocking(move |hasher| {
                hasher.hash_password(&password).map_err(|e| AuthError::Persistence(e.to_string()))
            })
            .await?;

        let identity = self.insert_account(new_account(&email, password_hash))?;
        switch_to(&mut self.lock(), Some(identity.clone()));
        self.persist_current().await;
        log::debug!("Signed up {}", identity.email);
        Ok(identity)
    }

    async fn sign_out(&self) -> AuthResult<()> {
        let (changed, offline) = {
            let mut state = self.lock();
            let changed = state.current.is_some();
            if changed {
                switch_to(&mut state, None);
            }
            (changed, state.offline)
        };
        if changed {
            self.persist_current().await;
            log::debug!("Signed out");
        }
        if offline {
            return Err(AuthError::Network("token revocation failed".to_string()));
        }
        Ok(())
    }

    fn observe_identity(&self) -> IdentityStream {
        let (tx, stream) = IdentityStream::channel();
        let mut state = self.lock();
        // Receiver is alive, the send cannot fail
        let _ = tx.send(state.current.clone());
        state.subscribers.push(tx);
        stream
    }

    fn current_identity(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    fn persistence(&self) -> PersistenceMode {
        self.persistence
    }
}
