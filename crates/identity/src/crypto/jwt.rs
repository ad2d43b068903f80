//! HS256 JWT encode/verify. Claims mirror the teacher's `Claims` (`sub`,
//! `exp`, `iat`) extended with this spec's `email`/`admin`.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};
use uuid::Uuid;

const LEEWAY_SECONDS: u64 = 5 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, admin: bool, exp: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            email,
            admin,
            exp: exp.timestamp(),
            iat: Utc::now().timestamp(),
        }
    }
}

/// Standard expiry: the first second of the next calendar month in `tz`.
/// Gives clean month-aligned refresh.
pub fn month_boundary_expiry(tz: &chrono_tz::Tz) -> DateTime<Utc> {
    let now = Utc::now().with_timezone(tz);
    let (next_year, next_month) = if now.format("%m").to_string() == "12" {
        (now.format("%Y").to_string().parse::<i32>().unwrap() + 1, 1)
    } else {
        (
            now.format("%Y").to_string().parse::<i32>().unwrap(),
            now.format("%m").to_string().parse::<u32>().unwrap() + 1,
        )
    };

    tz.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
        .with_timezone(&Utc)
}

pub fn encode_claims(secret: &str, claims: &Claims) -> Result<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::internal(format!("jwt encode failed: {e}")))
}

/// Verify signature and expiry (with the spec's 5-hour leeway) and return
/// the decoded claims.
pub fn decode_claims(secret: &str, token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = LEEWAY_SECONDS;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::unauthenticated("invalid or expired token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let secret = "test-secret";
        let claims = Claims::new(
            Uuid::new_v4(),
            "user@example.com".into(),
            false,
            Utc::now() + chrono::Duration::hours(1),
        );
        let token = encode_claims(secret, &claims).unwrap();
        let decoded = decode_claims(secret, &token).unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "user@example.com".into(),
            false,
            Utc::now() + chrono::Duration::hours(1),
        );
        let token = encode_claims("secret-a", &claims).unwrap();
        assert!(decode_claims("secret-b", &token).is_err());
    }

    #[test]
    fn expired_token_within_leeway_still_validates() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "user@example.com".into(),
            false,
            Utc::now() - chrono::Duration::hours(4),
        );
        let token = encode_claims("secret", &claims).unwrap();
        assert!(decode_claims("secret", &token).is_ok());
    }

    #[test]
    fn expired_token_beyond_leeway_is_rejected() {
        let claims = Claims::new(
            Uuid::new_v4(),
            "user@example.com".into(),
            false,
            Utc::now() - chrono::Duration::hours(6),
        );
        let token = encode_claims("secret", &claims).unwrap();
        assert!(decode_claims("secret", &token).is_err());
    }

    #[test]
    fn month_boundary_is_first_instant_of_next_month() {
        let tz = chrono_tz::UTC;
        let expiry = month_boundary_expiry(&tz);
        assert_eq!(expiry.format("%d %H:%M:%S").to_string(), "01 00:00:00");
    }
}
