//! PBKDF2-HMAC-SHA256 PAT hashing, deterministic so a PAT can be looked up
//! by its hash directly (unlike the randomized-salt API-key hashing scheme).

use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;

const ITERATIONS: u32 = 100_000;
const PAT_PREFIX: &str = "agixt_";

/// Generate a new PAT value: `agixt_` followed by 64 hex characters (32
/// random bytes), mirroring the teacher's `ApiKeyService` entropy source.
pub fn new_pat_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{}{}", PAT_PREFIX, hex::encode(bytes))
}

/// Hash a PAT value deterministically. `salt` is the process master key.
pub fn hash_pat(master_key: &str, token: &str) -> String {
    let mut out = [0u8; 32];
    pbkdf2_hmac::<Sha256>(token.as_bytes(), master_key.as_bytes(), ITERATIONS, &mut out);
    hex::encode(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_has_expected_shape() {
        let token = new_pat_token();
        assert!(token.starts_with(PAT_PREFIX));
        assert_eq!(token.len(), PAT_PREFIX.len() + 64);
        assert!(token[PAT_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn hash_is_deterministic() {
        let a = hash_pat("master", "agixt_abc");
        let b = hash_pat("master", "agixt_abc");
        assert_eq!(a, b);
    }

    #[test]
    fn different_tokens_hash_differently() {
        assert_ne!(
            hash_pat("master", "agixt_one"),
            hash_pat("master", "agixt_two")
        );
    }
}
