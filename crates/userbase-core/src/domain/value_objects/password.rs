//! Hashed password value object.

use crate::{PasswordEncoder, UserbaseError, UserbaseResult};
use std::fmt;

/// A password that has already been through a one-way hash.
///
/// There is no way to build one from plaintext without an encoder, so a
/// plaintext password can never reach storage.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Hashes `plain` with `encoder`.
    pub fn from_plain(plain: &str, encoder: &dyn PasswordEncoder) -> UserbaseResult<Self> {
        if plain.is_empty() {
            return Err(UserbaseError::validation("password must not be empty"));
        }
        let encoded = encoder.encode(plain)?;
        Self::from_hash(encoded)
    }

    /// Wraps an existing hash in PHC string format (`$alg$...$salt$hash`).
    pub fn from_hash(hash: impl Into<String>) -> UserbaseResult<Self> {
        let hash = hash.into();
        if !is_phc_string(&hash) {
            return Err(UserbaseError::validation(
                "password must be stored as a PHC hash string",
            ));
        }
        Ok(Self(hash))
    }

    /// Returns the encoded hash.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks `plain` against this hash.
    pub fn verify(&self, plain: &str, encoder: &dyn PasswordEncoder) -> UserbaseResult<bool> {
        encoder.matches(plain, &self.0)
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(<redacted>)")
    }
}

/// Returns true for strings shaped like `$id$...$hash` with at least an
/// algorithm id, one parameter segment and a hash segment.
#[must_use]
pub fn is_phc_string(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('$') else {
        return false;
    };
    let segments: Vec<&str> = rest.split('$').collect();
    segments.len() >= 3
        && segments.iter().all(|s| !s.is_empty())
        && segments[0]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ReversingEncoder;

    impl PasswordEncoder for ReversingEncoder {
        fn encode(&self, plain: &str) -> UserbaseResult<String> {
            Ok(format!("$rev$v=1${}", plain.chars().rev().collect::<String>()))
        }

        fn matches(&self, plain: &str, encoded: &str) -> UserbaseResult<bool> {
            Ok(self.encode(plain)? == encoded)
        }
    }

    #[test]
    fn test_from_plain_never_keeps_plaintext() {
        let hashed = HashedPassword::from_plain("hunter22", &ReversingEncoder).unwrap();
        assert_ne!(hashed.as_str(), "hunter22");
        assert!(hashed.verify("hunter22", &ReversingEncoder).unwrap());
        assert!(!hashed.verify("hunter23", &ReversingEncoder).unwrap());
    }

    #[test]
    fn test_from_plain_rejects_empty() {
        assert!(HashedPassword::from_plain("", &ReversingEncoder).is_err());
    }

    #[test]
    fn test_from_hash_requires_phc_shape() {
        assert!(HashedPassword::from_hash("$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA").is_ok());
        assert!(HashedPassword::from_hash("hunter22").is_err());
        assert!(HashedPassword::from_hash("$argon2id$$hash").is_err());
        assert!(HashedPassword::from_hash("$").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let hashed = HashedPassword::from_plain("secret-value", &ReversingEncoder).unwrap();
        let debug = format!("{hashed:?}");
        assert!(!debug.contains("eulav"));
        assert!(debug.contains("redacted"));
    }
}
