//! Cryptographic Utilities
//!
//! - AES-256-GCM field encryption with the wire format
//!   `"<ivHex>:<authTagHex>:<ciphertextHex>"`
//! - SHA-256 hashing (fast, deterministic; never for passwords)
//! - Secure random tokens and constant-time comparison
//!
//! ## Key handling
//! [`encrypt`] and [`decrypt`] take arbitrary key material and fit it to the
//! 32-byte AES key by truncating, or by right-padding with ASCII `'0'`. This
//! is a format-compatibility simplification, not a key derivation function:
//! callers should supply 32 bytes of high-entropy key material.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// AES key length in bytes
pub const KEY_LEN: usize = 32;

/// GCM IV length in bytes (16, not the usual 12, for payload compatibility)
pub const IV_LEN: usize = 16;

/// GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Default token length in bytes
pub const DEFAULT_TOKEN_BYTES: usize = 32;

const PAYLOAD_DELIMITER: char = ':';

/// AES-256-GCM with a 128-bit IV
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encryption/decryption failures
///
/// Messages are fixed strings: they never carry key material, plaintext or
/// the underlying cipher error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    Encryption,

    /// Malformed payload or authentication tag mismatch
    #[error("Decryption failed")]
    Decryption,
}

/// Generate cryptographically secure random bytes
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// `len` random bytes, lowercase hex encoded (`2 * len` characters)
pub fn generate_token(len: usize) -> String {
    hex::encode(random_bytes(len))
}

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// One-way SHA-256 digest as 64 lowercase hex characters
///
/// Suitable for fingerprinting tokens before storage. Password storage uses
/// [`crate::password::HashedPassword`] instead.
pub fn hash(data: &str) -> String {
    hex::encode(sha256(data.as_bytes()))
}

/// Constant-time comparison to prevent timing attacks
///
/// Only the length comparison short-circuits.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Encrypt `plaintext` under `key`
///
/// A fresh random IV is drawn for every call, so the same plaintext and key
/// never produce the same payload twice.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CryptoError> {
    let key = fit_key(key);
    let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));

    let iv = random_bytes(IV_LEN);
    let mut buffer = plaintext.as_bytes().to_vec();

    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
        .map_err(|_| CryptoError::Encryption)?;

    Ok(format!(
        "{}{d}{}{d}{}",
        hex::encode(&iv),
        hex::encode(tag),
        hex::encode(&buffer),
        d = PAYLOAD_DELIMITER
    ))
}

/// Decrypt a payload produced by [`encrypt`] with the same key
///
/// Any payload that is not exactly three lowercase hex fields with a 16-byte
/// IV and a 16-byte tag is rejected, as is any tag mismatch.
pub fn decrypt(payload: &str, key: &str) -> Result<String, CryptoError> {
    let mut parts = payload.split(PAYLOAD_DELIMITER);
    let (Some(iv_hex), Some(tag_hex), Some(ct_hex), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(CryptoError::Decryption);
    };

    let iv = decode_lower_hex(iv_hex).ok_or(CryptoError::Decryption)?;
    let tag = decode_lower_hex(tag_hex).ok_or(CryptoError::Decryption)?;
    let mut buffer = decode_lower_hex(ct_hex).ok_or(CryptoError::Decryption)?;

    if iv.len() != IV_LEN || tag.len() != TAG_LEN {
        return Err(CryptoError::Decryption);
    }

    let key = fit_key(key);
    let cipher = Aes256Gcm16::new(GenericArray::from_slice(&key[..]));

    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(&tag),
        )
        .map_err(|_| CryptoError::Decryption)?;

    // Authenticated bytes that are not UTF-8 were not produced by `encrypt`.
    String::from_utf8(buffer).map_err(|_| CryptoError::Decryption)
}

/// Truncate or `'0'`-pad key material to [`KEY_LEN`] bytes
fn fit_key(key: &str) -> Zeroizing<[u8; KEY_LEN]> {
    let mut fitted = Zeroizing::new([b'0'; KEY_LEN]);
    let bytes = key.as_bytes();
    let n = bytes.len().min(KEY_LEN);
    fitted[..n].copy_from_slice(&bytes[..n]);
    fitted
}

/// Strict lowercase hex decoding
///
/// Uppercase digits would decode to the same bytes, letting an edited
/// payload pass authentication, so they are refused.
fn decode_lower_hex(s: &str) -> Option<Vec<u8>> {
    if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    hex::decode(s).ok()
}
