//! Crypto (C3) — shared half: symmetric field encryption and PBKDF2 token
//! hashing. JWT encode/verify and TOTP generate/verify are the auth-specific
//! half and live in the `identity` crate, which depends on these primitives
//! for PAT hashing.

mod field_encryption;
mod pat_hash;

pub use field_encryption::{decrypt_field, encrypt_field};
pub use pat_hash::{hash_pat, new_pat_token};

/// Field names whose values must be routed through `encrypt_field` before
/// persistence, matched by substring per spec.md §4.3.
pub fn is_secret_field(field_name: &str) -> bool {
    let name = field_name.to_lowercase();
    name.contains("password") || name.contains("api_key") || name.contains("_secret")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_field_matching() {
        assert!(is_secret_field("password"));
        assert!(is_secret_field("api_key"));
        assert!(is_secret_field("client_secret"));
        assert!(is_secret_field("webhook_secret"));
        assert!(!is_secret_field("email"));
        assert!(!is_secret_field("name"));
    }
}
