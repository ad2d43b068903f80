//! RFC 6238 TOTP generate/verify. Standard step is 30s; spec.md calls for a
//! 60-second validity window on verification to tolerate clock skew, which
//! this implements as a +/-2-step scan (each step being 30s) reusing
//! `totp-rs`'s single-instant `generate`/`check` primitive rather than its
//! built-in `skew` (whose semantics count *steps*, not seconds, and would
//! silently double the tolerance if misread as seconds).

use shared::error::{Error, Result};
use std::time::{SystemTime, UNIX_EPOCH};
use totp_rs::{Algorithm, Secret, TOTP};

const STEP_SECONDS: u64 = 30;
const WINDOW_STEPS: i64 = 2; // +/- 60 seconds

fn build(seed_base32: &str) -> Result<TOTP> {
    let secret = Secret::Encoded(seed_base32.to_string())
        .to_bytes()
        .map_err(|e| Error::internal(format!("invalid TOTP seed: {e:?}")))?;

    TOTP::new(Algorithm::SHA1, 6, 1, STEP_SECONDS, secret)
        .map_err(|e| Error::internal(format!("invalid TOTP configuration: {e}")))
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Mint a fresh base32 TOTP seed for a new or reset account.
pub fn generate_seed() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

/// Generate the current 6-digit code for `seed_base32`.
pub fn generate_totp(seed_base32: &str) -> Result<String> {
    let totp = build(seed_base32)?;
    Ok(totp.generate(now_secs()))
}

/// Verify `code` against `seed_base32`, scanning a +/-60s window.
pub fn verify_totp(seed_base32: &str, code: &str) -> Result<bool> {
    let totp = build(seed_base32)?;
    let now = now_secs() as i64;

    for step in -WINDOW_STEPS..=WINDOW_STEPS {
        let candidate_time = now + step * STEP_SECONDS as i64;
        if candidate_time < 0 {
            continue;
        }
        if totp.generate(candidate_time as u64) == code {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> String {
        generate_seed()
    }

    #[test]
    fn current_code_verifies() {
        let seed = seed();
        let code = generate_totp(&seed).unwrap();
        assert!(verify_totp(&seed, &code).unwrap());
    }

    #[test]
    fn wrong_code_does_not_verify() {
        let seed = seed();
        assert!(!verify_totp(&seed, "000000").unwrap());
    }

    #[test]
    fn code_within_60s_window_verifies() {
        let seed = seed();
        let totp = build(&seed).unwrap();
        let now = now_secs();
        let code = totp.generate(now.saturating_sub(45));
        assert!(verify_totp(&seed, &code).unwrap());
    }
}
