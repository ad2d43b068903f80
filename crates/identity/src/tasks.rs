//! Background task supervisor: OAuth refresh sweep, OAuth expired-token
//! purge, token-blacklist purge. Grounded directly on the teacher's
//! `BackgroundTaskRunner` in `api-gateway/src/background_tasks.rs` — one
//! `tokio::spawn` per task, shared `CancellationToken` for shutdown,
//! `tokio::time::interval` skipping its first immediate tick.

use crate::oauth_broker::{OAuthBroker, ProviderRegistry};
use crate::repositories::{BlacklistRepository, OAuthCredentialRepository};
use chrono::{Duration as ChronoDuration, Utc};
use shared::DbPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

const OAUTH_REFRESH_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);
const OAUTH_REFRESH_WINDOW_MINUTES: i64 = 30;
const OAUTH_PURGE_RETENTION_DAYS: i64 = 30;
const BLACKLIST_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

pub struct TaskSupervisor {
    pool: DbPool,
    registry: Arc<dyn ProviderRegistry>,
    http: reqwest::Client,
}

impl TaskSupervisor {
    pub fn new(pool: DbPool, registry: Arc<dyn ProviderRegistry>, http: reqwest::Client) -> Self {
        Self { pool, registry, http }
    }

    /// Spawn every background task and return a token the caller cancels
    /// on shutdown.
    pub fn start(self) -> CancellationToken {
        let cancel_token = CancellationToken::new();

        let refresh_token = cancel_token.clone();
        let refresh_pool = self.pool.clone();
        let refresh_registry = self.registry.clone();
        let refresh_http = self.http.clone();
        tokio::spawn(async move {
            run_oauth_refresh_sweep(refresh_pool, refresh_registry, refresh_http, refresh_token).await;
        });

        let purge_token = cancel_token.clone();
        let purge_pool = self.pool.clone();
        tokio::spawn(async move {
            run_oauth_purge(purge_pool, purge_token).await;
        });

        let blacklist_token = cancel_token.clone();
        let blacklist_pool = self.pool.clone();
        tokio::spawn(async move {
            run_blacklist_purge(blacklist_pool, blacklist_token).await;
        });

        info!("identity background tasks started");
        cancel_token
    }
}

async fn run_oauth_refresh_sweep(
    pool: DbPool,
    registry: Arc<dyn ProviderRegistry>,
    http: reqwest::Client,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(OAUTH_REFRESH_SWEEP_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("OAuth refresh sweep stopping due to shutdown");
                break;
            }
            _ = ticker.tick() => {
                let broker = OAuthBroker::new(&pool, http.clone(), registry.as_ref());
                match broker.refresh_all_expiring(ChronoDuration::minutes(OAUTH_REFRESH_WINDOW_MINUTES)).await {
                    Ok(count) => debug!(refreshed = count, "OAuth refresh sweep completed"),
                    Err(e) => error!(error = %e, "OAuth refresh sweep failed"),
                }
            }
        }
    }
}

/// Sleeps until the next 02:00 UTC, then purges and repeats every 24h. The
/// teacher's other sweeps use a fixed interval because none of them need
/// wall-clock alignment; this one does, so it computes its own first delay
/// instead of relying on `tokio::time::interval`'s immediate first tick.
async fn run_oauth_purge(pool: DbPool, cancel_token: CancellationToken) {
    loop {
        let delay = duration_until_next_2am_utc();
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("OAuth purge task stopping due to shutdown");
                break;
            }
            _ = tokio::time::sleep(delay) => {
                match OAuthCredentialRepository::purge_expired_before(
                    &pool,
                    ChronoDuration::days(OAUTH_PURGE_RETENTION_DAYS),
                )
                .await
                {
                    Ok(count) => info!(deleted = count, "purged long-expired OAuth credentials"),
                    Err(e) => error!(error = %e, "OAuth credential purge failed"),
                }
            }
        }
    }
}

fn duration_until_next_2am_utc() -> Duration {
    let now = Utc::now();
    let today_2am = now.date_naive().and_hms_opt(2, 0, 0).unwrap();
    let next = if now.naive_utc() < today_2am {
        today_2am
    } else {
        today_2am + ChronoDuration::days(1)
    };
    (next - now.naive_utc())
        .to_std()
        .unwrap_or(Duration::from_secs(86400))
}

async fn run_blacklist_purge(pool: DbPool, cancel_token: CancellationToken) {
    let mut ticker = interval(BLACKLIST_PURGE_INTERVAL);
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("blacklist purge task stopping due to shutdown");
                break;
            }
            _ = ticker.tick() => {
                match BlacklistRepository::purge_expired(&pool).await {
                    Ok(count) => debug!(deleted = count, "purged expired blacklist entries"),
                    Err(e) => error!(error = %e, "blacklist purge failed"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_2am_is_never_more_than_24h_away() {
        let delay = duration_until_next_2am_utc();
        assert!(delay <= Duration::from_secs(86400));
    }
}
