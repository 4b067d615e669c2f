//! Password Strength and Hashing
//!
//! Two independent concerns live here:
//! - [`check_strength`] and [`is_common_password`] decide whether a new
//!   password is acceptable at signup
//! - [`ClearTextPassword`] and [`HashedPassword`] handle Argon2id hashing and
//!   verification for storage and login
//!
//! ## Security Features
//! - Memory-hard hashing prevents GPU/ASIC attacks
//! - Clear text is zeroized on drop and redacted from Debug output
//! - Optional application-wide pepper

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

pub use argon2::Params as HashParams;

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length accepted for hashing, in characters
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Characters that satisfy the special-character rule
pub const SPECIAL_CHARACTERS: &str = r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#;

/// Denylist of passwords too common to accept (compared case-insensitively)
const COMMON_PASSWORDS: &[&str] = &[
    "password", "123456", "12345678", "qwerty", "abc123", "monkey", "1234567", "letmein",
    "trustno1", "dragon", "baseball", "iloveyou", "master", "sunshine", "ashley",
];

// ============================================================================
// Strength Rules
// ============================================================================

/// A single password composition rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordRule {
    MinLength,
    Lowercase,
    Uppercase,
    Digit,
    Special,
}

impl PasswordRule {
    /// All rules, in evaluation order
    pub const ALL: [PasswordRule; 5] = [
        PasswordRule::MinLength,
        PasswordRule::Lowercase,
        PasswordRule::Uppercase,
        PasswordRule::Digit,
        PasswordRule::Special,
    ];

    pub fn is_met_by(&self, password: &str) -> bool {
        match self {
            PasswordRule::MinLength => password.chars().count() >= MIN_PASSWORD_LENGTH,
            PasswordRule::Lowercase => password.chars().any(|c| c.is_ascii_lowercase()),
            PasswordRule::Uppercase => password.chars().any(|c| c.is_ascii_uppercase()),
            PasswordRule::Digit => password.chars().any(|c| c.is_ascii_digit()),
            PasswordRule::Special => password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PasswordRule::MinLength => "Password must be at least 8 characters long",
            PasswordRule::Lowercase => "Password must contain at least one lowercase letter",
            PasswordRule::Uppercase => "Password must contain at least one uppercase letter",
            PasswordRule::Digit => "Password must contain at least one number",
            PasswordRule::Special => "Password must contain at least one special character",
        }
    }
}

/// Outcome of [`check_strength`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordAssessment {
    /// True only when every rule is met
    pub is_valid: bool,
    /// Number of rules met, 0..=5
    pub score: u8,
    /// Unmet-rule messages joined with `". "`, or `"Password is strong"`
    pub message: String,
    unmet: Vec<PasswordRule>,
}

impl PasswordAssessment {
    /// Rules the password failed, in evaluation order
    pub fn unmet(&self) -> &[PasswordRule] {
        &self.unmet
    }
}

/// Score a password against the composition rules
pub fn check_strength(password: &str) -> PasswordAssessment {
    let unmet: Vec<PasswordRule> = PasswordRule::ALL
        .into_iter()
        .filter(|rule| !rule.is_met_by(password))
        .collect();

    let score = (PasswordRule::ALL.len() - unmet.len()) as u8;
    let message = if unmet.is_empty() {
        "Password is strong".to_string()
    } else {
        unmet
            .iter()
            .map(PasswordRule::message)
            .collect::<Vec<_>>()
            .join(". ")
    };

    PasswordAssessment {
        is_valid: unmet.is_empty(),
        score,
        message,
        unmet,
    }
}

/// Case-insensitive membership in the common-password denylist
///
/// Best effort only: the list is small and static.
pub fn is_common_password(password: &str) -> bool {
    let lower = password.to_lowercase();
    COMMON_PASSWORDS.contains(&lower.as_str())
}

// ============================================================================
// Error Types
// ============================================================================

/// Input rejected before hashing or verification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordInputError {
    #[error("Password is required")]
    Empty,

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Does not implement `Clone`, and Debug output is redacted. Composition
/// rules are not applied here: the same type carries login attempts, which
/// must be verified rather than judged.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize (NFKC) and accept any non-empty password of bounded length
    pub fn new(raw: String) -> Result<Self, PasswordInputError> {
        let raw = Zeroizing::new(raw);
        let normalized: String = raw.nfkc().collect();

        if normalized.is_empty() {
            return Err(PasswordInputError::Empty);
        }

        let char_count = normalized.chars().count();
        if char_count > MAX_PASSWORD_LENGTH {
            return Err(PasswordInputError::TooLong {
                max: MAX_PASSWORD_LENGTH,
                actual: char_count,
            });
        }

        if normalized
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            return Err(PasswordInputError::InvalidCharacter);
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut combined = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            combined.extend_from_slice(p);
        }
        combined
    }

    /// Hash with the default Argon2id parameters (m=19456, t=2, p=1)
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        self.hash_with_params(pepper, Params::default())
    }

    /// Hash with explicit Argon2id parameters
    ///
    /// Verification reads the parameters back from the PHC string, so hashes
    /// made with different costs can coexist.
    pub fn hash_with_params(
        &self,
        pepper: Option<&[u8]>,
        params: Params,
    ) -> Result<HashedPassword, PasswordHashError> {
        let salt = SaltString::generate(OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let hash = argon2
            .hash_password(&self.peppered(pepper), &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Parse a stored PHC string
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// `pepper` must match the one used when hashing.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(&self.hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed_hash)
            .is_ok()
    }

    /// True when the hash is not Argon2id
    pub fn needs_rehash(&self) -> bool {
        match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed.algorithm != Algorithm::Argon2id.ident(),
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Params {
        Params::new(1024, 1, 1, None).unwrap()
    }

    fn password(s: &str) -> ClearTextPassword {
        ClearTextPassword::new(s.to_string()).unwrap()
    }

    #[test]
    fn test_strong_password_scores_five() {
        let result = check_strength("Abcdefg1!");
        assert!(result.is_valid);
        assert_eq!(result.score, 5);
        assert_eq!(result.message, "Password is strong");
        assert!(result.unmet().is_empty());
    }

    #[test]
    fn test_weak_password_lists_unmet_rules() {
        let result = check_strength("abc");
        assert!(!result.is_valid);
        assert!(result.score <= 2);
        assert_eq!(
            result.unmet(),
            &[
                PasswordRule::MinLength,
                PasswordRule::Uppercase,
                PasswordRule::Digit,
                PasswordRule::Special,
            ]
        );
        assert_eq!(
            result.message,
            "Password must be at least 8 characters long. \
             Password must contain at least one uppercase letter. \
             Password must contain at least one number. \
             Password must contain at least one special character"
        );
    }

    #[test]
    fn test_empty_password_fails_every_rule() {
        let result = check_strength("");
        assert_eq!(result.score, 0);
        assert_eq!(result.unmet().len(), 5);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 7 characters, 14+ bytes
        assert!(!PasswordRule::MinLength.is_met_by("ééééééé"));
        assert!(PasswordRule::MinLength.is_met_by("éééééééé"));
    }

    #[test]
    fn test_every_listed_special_character_counts() {
        for c in SPECIAL_CHARACTERS.chars() {
            assert!(PasswordRule::Special.is_met_by(&c.to_string()), "{c:?}");
        }
        assert!(!PasswordRule::Special.is_met_by("~`"));
    }

    #[test]
    fn test_common_passwords_case_insensitive() {
        assert!(is_common_password("password"));
        assert!(is_common_password("PASSWORD"));
        assert!(is_common_password("LetMeIn"));
        assert!(is_common_password("123456"));
        assert!(!is_common_password("MySecure#Pass2024!"));
        assert!(!is_common_password("password1"));
    }

    #[test]
    fn test_clear_text_input_checks() {
        assert_eq!(
            ClearTextPassword::new(String::new()).unwrap_err(),
            PasswordInputError::Empty
        );
        assert!(matches!(
            ClearTextPassword::new("a".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(PasswordInputError::TooLong { .. })
        ));
        assert_eq!(
            ClearTextPassword::new("abc\u{0000}def".to_string()).unwrap_err(),
            PasswordInputError::InvalidCharacter
        );
        // Short passwords are accepted here; strength is judged elsewhere.
        assert!(ClearTextPassword::new("abc".to_string()).is_ok());
    }

    #[test]
    fn test_nfkc_normalization() {
        // Fullwidth 'Ａ' normalizes to 'A'
        assert_eq!(password("Ａbc").as_str(), "Abc");
    }

    #[test]
    fn test_hash_and_verify() {
        let hashed = password("TestPassword123!")
            .hash_with_params(None, cheap())
            .unwrap();

        assert!(hashed.verify(&password("TestPassword123!"), None));
        assert!(!hashed.verify(&password("WrongPassword123!"), None));
        assert!(!hashed.needs_rehash());
    }

    #[test]
    fn test_hash_with_pepper() {
        let pepper = b"my_secret_pepper";
        let hashed = password("TestPassword123!")
            .hash_with_params(Some(pepper), cheap())
            .unwrap();

        assert!(hashed.verify(&password("TestPassword123!"), Some(pepper)));
        assert!(!hashed.verify(&password("TestPassword123!"), None));
        assert!(!hashed.verify(&password("TestPassword123!"), Some(b"wrong_pepper")));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let a = password("Abcdefg1!").hash_with_params(None, cheap()).unwrap();
        let b = password("Abcdefg1!").hash_with_params(None, cheap()).unwrap();
        assert_ne!(a.as_phc_string(), b.as_phc_string());
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let hashed = password("TestPassword123!")
            .hash_with_params(None, cheap())
            .unwrap();
        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password("TestPassword123!"), None));
        assert!(restored.as_phc_string().starts_with("$argon2id$"));
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let debug_output = format!("{:?}", password("secret-value"));
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret-value"));
    }
}
