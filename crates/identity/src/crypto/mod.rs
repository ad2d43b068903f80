//! Crypto (C3), auth-specific half: JWT encode/verify and TOTP
//! generate/verify. Field encryption and PAT hashing are the `shared`
//! crate's half (`shared::crypto`); this module wraps that primitive in a
//! short-lived JWT for the "JWT-wrapped symmetric blob" contract.

mod jwt;
mod totp;
mod wrapped_secret;

pub use jwt::{decode_claims, encode_claims, month_boundary_expiry, Claims};
pub use totp::{generate_seed, generate_totp, verify_totp};
pub use wrapped_secret::{unwrap_secret, wrap_secret};
