//! MagicLink (C8): OTP-based passwordless login. Request issues a TOTP code
//! over the `Notifier` capability; verify checks it (60s window) and mints a
//! month-boundary JWT. Failed attempts are tracked in a 24h sliding window
//! per spec.md §4.8, grounded on the teacher's Redis sliding-window rate
//! limiter reused here as a library building block.

use crate::crypto::{jwt, totp};
use crate::notifier::{Notification, Notifier};
use chrono::{Duration, Utc};
use shared::cache::{keys, SharedCache};
use shared::config::ServerConfig;
use shared::error::{Error, Result};
use shared::models::User;
use shared::DbPool;
use std::sync::Arc;
use uuid::Uuid;

const FAILED_LOGIN_WINDOW_HOURS: i64 = 24;
const FAILED_LOGIN_LIMIT: i64 = 100;

/// Returned by `verify`: both forms spec.md §4.8 allows the caller to use.
pub struct VerifiedLogin {
    pub user: User,
    pub token: String,
    pub signed_url: String,
}

pub struct MagicLink<'a> {
    pool: &'a DbPool,
    cache: Arc<dyn SharedCache>,
    server_config: &'a ServerConfig,
    notifier: Arc<dyn Notifier>,
}

impl<'a> MagicLink<'a> {
    pub fn new(
        pool: &'a DbPool,
        cache: Arc<dyn SharedCache>,
        server_config: &'a ServerConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            cache,
            server_config,
            notifier,
        }
    }

    /// Send the current OTP to `email`. Always returns `Ok(())`, known email
    /// or not, so a caller watching the response can't distinguish the two
    /// (spec.md §4.8 enumeration-resistance requirement).
    pub async fn request(&self, email: &str) -> Result<()> {
        match crate::repositories::UserRepository::find_by_email(self.pool, email).await? {
            Some(user) => {
                let code = totp::generate_totp(&user.mfa_seed)?;
                let notification = Notification {
                    to: user.email.clone(),
                    subject: "Your login code".to_string(),
                    body: format!("Your one-time login code is {code}. It is valid for a few minutes."),
                };
                if let Err(e) = self.notifier.send(notification).await {
                    tracing::warn!(error = %e, "failed to deliver magic-link notification");
                }
            }
            None => {
                let notification = Notification {
                    to: email.to_string(),
                    subject: "Login attempt".to_string(),
                    body: "We received a login request for this address, but no account exists yet."
                        .to_string(),
                };
                if let Err(e) = self.notifier.send(notification).await {
                    tracing::warn!(error = %e, "failed to deliver magic-link notification");
                }
            }
        }
        Ok(())
    }

    /// Verify `otp` for `email`. Rejects once the 24h failed-attempt window
    /// has reached 100 hits; every wrong guess (including against an unknown
    /// email) counts toward that window.
    pub async fn verify(&self, email: &str, otp: &str) -> Result<VerifiedLogin> {
        let user = crate::repositories::UserRepository::find_by_email(self.pool, email).await?;

        let bucket = Utc::now().timestamp() / (FAILED_LOGIN_WINDOW_HOURS * 3600);
        let counter_user_id = user.as_ref().map(|u| u.id).unwrap_or_else(Uuid::nil);
        let counter_key = keys::failed_login(counter_user_id, bucket);

        let attempts = self
            .cache
            .increment(
                &counter_key,
                std::time::Duration::from_secs((FAILED_LOGIN_WINDOW_HOURS * 3600) as u64),
            )
            .await
            .unwrap_or(0);
        if attempts > FAILED_LOGIN_LIMIT {
            return Err(Error::rate_limited("too many failed login attempts"));
        }

        let user = match user {
            Some(u) => u,
            None => return Err(Error::unauthenticated("invalid code")),
        };

        if !totp::verify_totp(&user.mfa_seed, otp)? {
            return Err(Error::unauthenticated("invalid code"));
        }

        let user = if !user.is_active {
            crate::repositories::UserRepository::set_active(self.pool, user.id, true).await?
        } else {
            user
        };

        let tz = chrono_tz::UTC;
        let expiry = jwt::month_boundary_expiry(&tz);
        let claims = jwt::Claims::new(user.id, user.email.clone(), false, expiry);
        let token = jwt::encode_claims(&self.server_config.jwt_secret, &claims)?;
        let signed_url = format!(
            "{}?token={}",
            self.server_config.app_uri,
            urlencoding::encode(&token)
        );

        Ok(VerifiedLogin {
            user,
            token,
            signed_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_24_hours() {
        assert_eq!(Duration::hours(FAILED_LOGIN_WINDOW_HOURS), Duration::hours(24));
    }
}
