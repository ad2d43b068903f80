//! AES-256-GCM field encryption primitive.
//!
//! This module produces the raw `nonce || ciphertext` blob, base64-encoded.
//! The `identity` crate wraps this blob in a short-lived HS256 JWT (so the
//! blob carries its own `exp`) — that half lives alongside the rest of the
//! JWT machinery rather than here, to avoid pulling `jsonwebtoken` into this
//! crate for a single call site.

use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};

fn derive_key(master_key: &str) -> Key<Aes256Gcm> {
    let digest = Sha256::digest(master_key.as_bytes());
    *Key::<Aes256Gcm>::from_slice(&digest)
}

/// Encrypt `plaintext` under `master_key`, returning a base64 `nonce ||
/// ciphertext` blob.
pub fn encrypt_field(master_key: &str, plaintext: &str) -> Result<String> {
    let cipher = Aes256Gcm::new(&derive_key(master_key));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| Error::internal(format!("field encryption failed: {e}")))?;

    let mut blob = Vec::with_capacity(nonce.len() + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(blob))
}

/// Decrypt a blob produced by `encrypt_field`.
pub fn decrypt_field(master_key: &str, blob_b64: &str) -> Result<String> {
    let blob = STANDARD
        .decode(blob_b64)
        .map_err(|e| Error::internal(format!("invalid ciphertext encoding: {e}")))?;

    if blob.len() < 12 {
        return Err(Error::internal("ciphertext blob too short"));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(12);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(&derive_key(master_key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| Error::internal(format!("field decryption failed: {e}")))?;

    String::from_utf8(plaintext).map_err(|e| Error::internal(format!("invalid utf8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let key = "master-key-for-tests";
        let blob = encrypt_field(key, "sk_live_abcdef").unwrap();
        assert_ne!(blob, "sk_live_abcdef");
        assert_eq!(decrypt_field(key, &blob).unwrap(), "sk_live_abcdef");
    }

    #[test]
    fn wrong_key_fails() {
        let blob = encrypt_field("key-a", "secret").unwrap();
        assert!(decrypt_field("key-b", &blob).is_err());
    }

    #[test]
    fn each_encryption_uses_a_fresh_nonce() {
        let key = "master-key";
        let a = encrypt_field(key, "same-plaintext").unwrap();
        let b = encrypt_field(key, "same-plaintext").unwrap();
        assert_ne!(a, b);
    }
}
