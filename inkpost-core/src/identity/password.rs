//! Password hashing for locally held accounts
//!
//! Argon2id v0x13 stored in PHC string format, so algorithm, cost and salt
//! travel with each hash. Accounts hashed under an older cost are upgraded on
//! their next successful sign-in (see [`PasswordHasherService::needs_rehash`]).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id hasher with a fixed cost
#[derive(Clone)]
pub struct PasswordHasherService {
    argon2: Argon2<'static>,
    params: Params,
}

impl PasswordHasherService {
    /// Hasher using the argon2 crate's default cost
    pub fn new() -> Self {
        Self::with_params(Params::default())
    }

    /// Hasher using an explicit memory/time/parallelism cost
    pub fn with_params(params: Params) -> Self {
        Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone()), params }
    }

    /// Hash a password, returning the PHC string
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored PHC hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
        }
    }

    /// Whether `hash` was produced with another algorithm, version or cost
    ///
    /// Unparsable hashes count as outdated.
    pub fn needs_rehash(&self, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return true;
        };
        if parsed.algorithm != Algorithm::Argon2id.ident()
            || parsed.version != Some(Version::V0x13 as u32)
        {
            return true;
        }
        match Params::try_from(&parsed) {
            Ok(stored) => {
                stored.m_cost() != self.params.m_cost()
                    || stored.t_cost() != self.params.t_cost()
                    || stored.p_cost() != self.params.p_cost()
            }
            Err(_) => true,
        }
    }

    /// Verify `password`, returning a fresh hash when the stored one is outdated
    ///
    /// `Ok(None)` means the password was wrong.
    pub fn verify_and_upgrade(
        &self,
        password: &str,
        hash: &str,
    ) -> Result<Option<Verified>, PasswordError> {
        if !self.verify_password(password, hash)? {
            return Ok(None);
        }
        let upgraded =
            if self.needs_rehash(hash) { Some(self.hash_password(password)?) } else { None };
        Ok(Some(Verified { upgraded }))
    }
}

impl Default for PasswordHasherService {
    fn default() -> Self {
        Self::new()
    }
}

/// Successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    /// Replacement hash at the current cost, if the stored one was outdated
    pub upgraded: Option<String>,
}

/// Password-related errors
#[derive(thiserror::Error, Debug, Clone)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
}
