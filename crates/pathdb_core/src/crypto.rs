//! Record encryption using AES-GCM keyed from a passphrase.
//!
//! A [`Cipher`] is installed once per collection tree and shared by reference
//! with every derived [`Collection`](crate::Collection) and
//! [`Query`](crate::Query). Key material is derived deterministically from
//! the passphrase with HKDF-SHA256 so that independent processes opening the
//! same store with the same secret agree on the key without any stored state.
//!
//! Wire format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`. The GCM
//! tag makes decryption authenticated: tampered or truncated ciphertext
//! surfaces as a `DecryptionFailed` error, never as garbage plaintext.

use crate::error::{StoreError, StoreResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes128Gcm, Aes256Gcm, Nonce};
use hkdf::Hkdf;
use parking_lot::RwLock;
use rand::RngCore;
use sha2::Sha256;
use std::sync::Arc;
use zeroize::Zeroizing;

/// Size of the GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// HKDF info string binding derived keys to this application.
const KEY_INFO: &[u8] = b"pathdb-record-key-v1";

/// Shared cipher slot: one per collection tree, shared by identity.
///
/// Re-installing a cipher overwrites the slot for every handle derived from
/// the same root.
pub(crate) type SharedCipher = Arc<RwLock<Option<Cipher>>>;

#[derive(Clone)]
enum Inner {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

/// Symmetric encryption capability for record payloads.
///
/// Cloning copies the expanded key schedule; operations take a clone out of
/// the shared slot so the slot lock is never held across file I/O.
#[derive(Clone)]
pub struct Cipher {
    inner: Inner,
}

impl Cipher {
    /// Creates an AES-128-GCM cipher keyed from `secret`.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is empty.
    pub fn aes128(secret: &str) -> StoreResult<Self> {
        let key = derive_key(secret, 16)?;
        let cipher = Aes128Gcm::new_from_slice(&key)
            .map_err(|_| StoreError::key_derivation_failed("invalid key length"))?;
        Ok(Self {
            inner: Inner::Aes128(cipher),
        })
    }

    /// Creates an AES-256-GCM cipher keyed from `secret`.
    ///
    /// # Errors
    ///
    /// Returns `KeyDerivationFailed` if the secret is empty.
    pub fn aes256(secret: &str) -> StoreResult<Self> {
        let key = derive_key(secret, 32)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|_| StoreError::key_derivation_failed("invalid key length"))?;
        Ok(Self {
            inner: Inner::Aes256(cipher),
        })
    }

    /// Encrypts `plaintext`, prepending a random nonce.
    ///
    /// # Errors
    ///
    /// Returns `EncryptionFailed` if the underlying AEAD rejects the input.
    pub fn encrypt(&self, plaintext: &[u8]) -> StoreResult<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = match &self.inner {
            Inner::Aes128(cipher) => cipher.encrypt(nonce, plaintext),
            Inner::Aes256(cipher) => cipher.encrypt(nonce, plaintext),
        }
        .map_err(|_| StoreError::encryption_failed("encryption error"))?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce_bytes);
        result.extend(ciphertext);
        Ok(result)
    }

    /// Decrypts data produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns `DecryptionFailed` if the data is too short, was tampered
    /// with, or was encrypted under a different key.
    pub fn decrypt(&self, ciphertext: &[u8]) -> StoreResult<Vec<u8>> {
        if ciphertext.len() < NONCE_SIZE + TAG_SIZE {
            return Err(StoreError::decryption_failed("ciphertext too short"));
        }

        let nonce = Nonce::from_slice(&ciphertext[..NONCE_SIZE]);
        let encrypted = &ciphertext[NONCE_SIZE..];

        match &self.inner {
            Inner::Aes128(cipher) => cipher.decrypt(nonce, encrypted),
            Inner::Aes256(cipher) => cipher.decrypt(nonce, encrypted),
        }
        .map_err(|_| StoreError::decryption_failed("decryption error"))
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let algorithm = match self.inner {
            Inner::Aes128(_) => "Aes128Gcm",
            Inner::Aes256(_) => "Aes256Gcm",
        };
        f.debug_struct("Cipher").field("algorithm", &algorithm).finish()
    }
}

/// Derives `len` bytes of key material from a passphrase.
///
/// No salt is used: every process opening the store must derive the same key
/// from the passphrase alone, with nothing persisted beside the records.
fn derive_key(secret: &str, len: usize) -> StoreResult<Zeroizing<Vec<u8>>> {
    if secret.is_empty() {
        return Err(StoreError::key_derivation_failed("empty secret"));
    }

    let hk = Hkdf::<Sha256>::new(None, secret.as_bytes());
    let mut key = Zeroizing::new(vec![0u8; len]);
    hk.expand(KEY_INFO, &mut key)
        .map_err(|_| StoreError::key_derivation_failed("HKDF expand failed"))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip_aes128() {
        let cipher = Cipher::aes128("s3cret").unwrap();

        let plaintext = b"hello pathdb";
        let ciphertext = cipher.encrypt(plaintext).unwrap();
        assert_ne!(&ciphertext[NONCE_SIZE..], plaintext);

        let decrypted = cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn encrypt_decrypt_roundtrip_aes256() {
        let cipher = Cipher::aes256("s3cret").unwrap();

        let plaintext = b"hello pathdb";
        let ciphertext = cipher.encrypt(plaintext).unwrap();
        let decrypted = cipher.decrypt(&ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn derivation_is_deterministic() {
        // Two independently constructed ciphers from the same secret must be
        // able to read each other's output (cross-process contract).
        let writer = Cipher::aes256("shared-secret").unwrap();
        let reader = Cipher::aes256("shared-secret").unwrap();

        let ciphertext = writer.encrypt(b"payload").unwrap();
        assert_eq!(reader.decrypt(&ciphertext).unwrap(), b"payload");
    }

    #[test]
    fn wrong_secret_fails() {
        let writer = Cipher::aes256("secret-a").unwrap();
        let reader = Cipher::aes256("secret-b").unwrap();

        let ciphertext = writer.encrypt(b"payload").unwrap();
        let result = reader.decrypt(&ciphertext);
        assert!(matches!(result, Err(StoreError::DecryptionFailed { .. })));
    }

    #[test]
    fn mismatched_algorithms_fail() {
        let writer = Cipher::aes128("secret").unwrap();
        let reader = Cipher::aes256("secret").unwrap();

        let ciphertext = writer.encrypt(b"payload").unwrap();
        assert!(reader.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = Cipher::aes256("s3cret").unwrap();

        let mut ciphertext = cipher.encrypt(b"payload").unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xFF;

        let result = cipher.decrypt(&ciphertext);
        assert!(matches!(result, Err(StoreError::DecryptionFailed { .. })));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let cipher = Cipher::aes256("s3cret").unwrap();

        let result = cipher.decrypt(&[0u8; 10]);
        assert!(matches!(result, Err(StoreError::DecryptionFailed { .. })));
    }

    #[test]
    fn empty_secret_rejected() {
        assert!(matches!(
            Cipher::aes128(""),
            Err(StoreError::KeyDerivationFailed { .. })
        ));
        assert!(matches!(
            Cipher::aes256(""),
            Err(StoreError::KeyDerivationFailed { .. })
        ));
    }

    #[test]
    fn nonces_differ_between_calls() {
        let cipher = Cipher::aes256("s3cret").unwrap();

        let ct1 = cipher.encrypt(b"same data").unwrap();
        let ct2 = cipher.encrypt(b"same data").unwrap();
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let cipher = Cipher::aes256("s3cret").unwrap();

        let ciphertext = cipher.encrypt(b"").unwrap();
        assert_eq!(cipher.decrypt(&ciphertext).unwrap(), b"");
    }
}
