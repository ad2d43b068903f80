//! Integration coverage for the bearer-credential classification and JWT
//! round-trip that sit in front of every DB-backed `AuthSession::resolve`
//! path. The DB-backed half (`resolve`/`hydrate`) needs a live Postgres
//! instance and is exercised by the crate's own `#[cfg(test)]` modules
//! rather than here.

use identity::auth_session::{parse_bearer, BearerCredential};
use identity::crypto::{decode_claims, encode_claims, month_boundary_expiry, Claims};

const MASTER_KEY: &str = "test-master-key";

#[test]
fn master_key_bearer_classifies_as_master_key() {
    let credential = parse_bearer("Bearer test-master-key", MASTER_KEY);
    assert!(matches!(credential, BearerCredential::MasterKey));
}

#[test]
fn master_key_without_bearer_prefix_still_classifies() {
    let credential = parse_bearer("test-master-key", MASTER_KEY);
    assert!(matches!(credential, BearerCredential::MasterKey));
}

#[test]
fn agixt_prefixed_token_classifies_as_pat() {
    let credential = parse_bearer("Bearer agixt_abc123", MASTER_KEY);
    match credential {
        BearerCredential::Pat(token) => assert_eq!(token, "agixt_abc123"),
        other => panic!("expected Pat, got {other:?}"),
    }
}

#[test]
fn anything_else_classifies_as_jwt() {
    let credential = parse_bearer("Bearer some.jwt.token", MASTER_KEY);
    match credential {
        BearerCredential::Jwt(token) => assert_eq!(token, "some.jwt.token"),
        other => panic!("expected Jwt, got {other:?}"),
    }
}

#[test]
fn claims_round_trip_through_encode_decode() {
    let user_id = uuid::Uuid::new_v4();
    let expiry = month_boundary_expiry(&chrono_tz::UTC);
    let claims = Claims::new(user_id, "person@example.com".to_string(), false, expiry);

    let token = encode_claims("test-jwt-secret", &claims).unwrap();
    let decoded = decode_claims("test-jwt-secret", &token).unwrap();

    assert_eq!(decoded.sub, user_id);
    assert_eq!(decoded.email, "person@example.com");
    assert!(!decoded.admin);
}

#[test]
fn decode_rejects_wrong_secret() {
    let expiry = month_boundary_expiry(&chrono_tz::UTC);
    let claims = Claims::new(uuid::Uuid::new_v4(), "person@example.com".to_string(), false, expiry);
    let token = encode_claims("right-secret", &claims).unwrap();

    assert!(decode_claims("wrong-secret", &token).is_err());
}
