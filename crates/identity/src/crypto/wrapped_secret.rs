//! "JWT-wrapped symmetric blob" per spec.md §4.3: the AES-GCM ciphertext
//! produced by `shared::crypto::encrypt_field` is embedded in a short-lived
//! HS256 JWT so the blob carries its own `exp`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::crypto::{decrypt_field, encrypt_field};
use shared::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
struct WrappedClaims {
    blob: String,
    exp: i64,
    iat: i64,
}

/// Encrypt `plaintext` and wrap it in a JWT valid for `ttl`.
pub fn wrap_secret(master_key: &str, jwt_secret: &str, plaintext: &str, ttl: Duration) -> Result<String> {
    let blob = encrypt_field(master_key, plaintext)?;
    let now = Utc::now();
    let claims = WrappedClaims {
        blob,
        exp: (now + ttl).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| Error::internal(format!("secret wrap failed: {e}")))
}

/// Unwrap and decrypt a blob produced by `wrap_secret`.
pub fn unwrap_secret(master_key: &str, jwt_secret: &str, wrapped: &str) -> Result<String> {
    let data = decode::<WrappedClaims>(
        wrapped,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| Error::unauthenticated("invalid or expired secret wrapper"))?;

    decrypt_field(master_key, &data.claims.blob)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let wrapped = wrap_secret("master", "jwt-secret", "sk_live_123", Duration::minutes(5)).unwrap();
        assert_eq!(
            unwrap_secret("master", "jwt-secret", &wrapped).unwrap(),
            "sk_live_123"
        );
    }

    #[test]
    fn expired_wrapper_is_rejected() {
        let wrapped = wrap_secret("master", "jwt-secret", "sk_live_123", Duration::seconds(-1)).unwrap();
        assert!(unwrap_secret("master", "jwt-secret", &wrapped).is_err());
    }
}
