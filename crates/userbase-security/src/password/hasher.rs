//! Password hashing using Argon2.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::sync::Arc;
use tracing::debug;
use userbase_config::SecurityConfig;
use userbase_core::{PasswordEncoder, UserbaseError, UserbaseResult};

/// Argon2id password hasher.
///
/// Hashes are PHC strings carrying their own salt and parameters, so a hash
/// made with older settings still verifies after the settings change.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Arc<Argon2<'static>>,
    params: Params,
}

impl PasswordHasher {
    /// Creates a new password hasher with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(Params::DEFAULT)
    }

    /// Creates a new password hasher with custom parameters.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.clone());
        Self {
            argon2: Arc::new(argon2),
            params,
        }
    }

    /// Creates a hasher from an iteration count and a memory cost in KiB.
    pub fn with_cost(iterations: u32, memory_kib: u32) -> UserbaseResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None).map_err(|e| {
            UserbaseError::Configuration(format!("Invalid password hashing parameters: {e}"))
        })?;
        Ok(Self::with_params(params))
    }

    /// Creates a hasher from the `security` configuration section.
    pub fn from_config(config: &SecurityConfig) -> UserbaseResult<Self> {
        Self::with_cost(config.password_hash_cost, config.password_memory_kib)
    }

    /// Hashes a password.
    pub fn hash(&self, password: &str) -> UserbaseResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| UserbaseError::Internal(format!("Failed to hash password: {e}")))?;

        debug!("Password hashed successfully");
        Ok(hash.to_string())
    }

    /// Verifies a password against a hash.
    pub fn verify(&self, password: &str, hash: &str) -> UserbaseResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| UserbaseError::Internal(format!("Invalid password hash format: {e}")))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => {
                debug!("Password verified successfully");
                Ok(true)
            }
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed: incorrect password");
                Ok(false)
            }
            Err(e) => Err(UserbaseError::Internal(format!(
                "Password verification error: {e}"
            ))),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordEncoder for PasswordHasher {
    fn encode(&self, plain: &str) -> UserbaseResult<String> {
        self.hash(plain)
    }

    fn matches(&self, plain: &str, encoded: &str) -> UserbaseResult<bool> {
        self.verify(plain, encoded)
    }
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("m_cost", &self.params.m_cost())
            .field("t_cost", &self.params.t_cost())
            .finish_non_exhaustive()
    }
}
