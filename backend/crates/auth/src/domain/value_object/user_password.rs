//! User Password Value Object
//!
//! Domain wrappers around `platform::password`: [`RawPassword`] for input
//! and [`UserPassword`] for the stored Argon2id hash.

use platform::password::{ClearTextPassword, HashParams, HashedPassword, PasswordInputError};
use std::fmt;

use crate::error::{AuthError, AuthResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Password as typed by the user; zeroized on drop
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    pub fn new(raw: String) -> AuthResult<Self> {
        ClearTextPassword::new(raw)
            .map(Self)
            .map_err(|e| match e {
                PasswordInputError::Empty => {
                    AuthError::Validation("Email and password are required".to_string())
                }
                other => AuthError::Validation(other.to_string()),
            })
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Stored password hash (PHC string)
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash `raw` with the given Argon2id cost
    pub fn from_raw(
        raw: &RawPassword,
        pepper: Option<&[u8]>,
        params: HashParams,
    ) -> AuthResult<Self> {
        raw.inner()
            .hash_with_params(pepper, params)
            .map(Self)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Parse a PHC string read from the database
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| AuthError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashParams {
        HashParams::new(1024, 1, 1, None).unwrap()
    }

    #[test]
    fn test_raw_password_validation() {
        assert!(RawPassword::new("ValidPass123!".to_string()).is_ok());
        assert!(matches!(
            RawPassword::new(String::new()),
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            RawPassword::new("a".repeat(200)),
            Err(AuthError::Validation(_))
        ));
    }

    #[test]
    fn test_hash_and_verify_with_pepper() {
        let raw = RawPassword::new("Abcdefg1!".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, Some(b"pepper"), cheap()).unwrap();

        assert!(hashed.verify(&raw, Some(b"pepper")));
        assert!(!hashed.verify(&raw, None));

        let wrong = RawPassword::new("Abcdefg1?".to_string()).unwrap();
        assert!(!hashed.verify(&wrong, Some(b"pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = RawPassword::new("Abcdefg1!".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None, cheap()).unwrap();
        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None));

        assert!(UserPassword::from_phc_string("plaintext").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::new("SecretPassword123!".to_string()).unwrap();
        assert!(!format!("{raw:?}").contains("Secret"));

        let hashed = UserPassword::from_raw(&raw, None, cheap()).unwrap();
        assert!(!format!("{hashed:?}").contains("argon2"));
    }
}
