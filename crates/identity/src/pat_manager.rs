//! PATManager (C10): create/list/revoke/regenerate PATs; validate incoming
//! PATs; enforce per-PAT scope/agent/tenant restrictions.

use crate::repositories::PatRepository;
use authz::repositories::AgentRepository;
use authz::{ScopeEngine, TenantTree};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use shared::cache::SharedCache;
use shared::config::ServerConfig;
use shared::crypto::{hash_pat, new_pat_token};
use shared::error::{Error, Result};
use shared::models::PersonalAccessToken;
use shared::DbPool;
use std::sync::Arc;
use uuid::Uuid;

/// `1_day`, `7_days`, `30_days`, `90_days`, `1_year`, `never`, or an
/// ISO-8601 timestamp (spec.md §4.10 expiration shorthand).
#[derive(Debug, Clone)]
pub enum ExpirationSpec {
    OneDay,
    SevenDays,
    ThirtyDays,
    NinetyDays,
    OneYear,
    Never,
    At(DateTime<Utc>),
}

impl ExpirationSpec {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "1_day" => Ok(Self::OneDay),
            "7_days" => Ok(Self::SevenDays),
            "30_days" => Ok(Self::ThirtyDays),
            "90_days" => Ok(Self::NinetyDays),
            "1_year" => Ok(Self::OneYear),
            "never" => Ok(Self::Never),
            other => DateTime::parse_from_rfc3339(other)
                .map(|dt| Self::At(dt.with_timezone(&Utc)))
                .map_err(|_| Error::validation(format!("invalid expiration shorthand: {other}"))),
        }
    }

    fn resolve(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        match self {
            Self::OneDay => Some(now + Duration::days(1)),
            Self::SevenDays => Some(now + Duration::days(7)),
            Self::ThirtyDays => Some(now + Duration::days(30)),
            Self::NinetyDays => Some(now + Duration::days(90)),
            Self::OneYear => Some(now + Duration::days(365)),
            Self::Never => None,
            Self::At(dt) => Some(*dt),
        }
    }
}

/// Creation request. `scopes` must be a strict subset of `creator_user_id`'s
/// granted scopes in `creator_tenant_id`; `agent_ids`/`tenant_ids` must lie
/// within the creator's reach.
pub struct CreatePatRequest {
    pub creator_user_id: Uuid,
    pub creator_tenant_id: Uuid,
    pub name: String,
    pub scopes: Vec<String>,
    pub agent_ids: Vec<Uuid>,
    pub tenant_ids: Vec<Uuid>,
    pub expires: ExpirationSpec,
}

/// Raw token value returned once at creation, never retrievable again.
pub struct CreatedPat {
    pub record: PersonalAccessToken,
    pub token: String,
}

/// `(user_id, scopes, agent_ids, tenant_ids, token_name)` per spec.md §4.10.
pub struct ValidatedPat {
    pub user_id: Uuid,
    pub scopes: Vec<String>,
    pub agent_ids: Vec<Uuid>,
    pub tenant_ids: Vec<Uuid>,
    pub token_name: String,
}

pub struct PatManager<'a> {
    pool: &'a DbPool,
    config: &'a ServerConfig,
    cache: Arc<dyn SharedCache>,
}

impl<'a> PatManager<'a> {
    pub fn new(pool: &'a DbPool, config: &'a ServerConfig, cache: Arc<dyn SharedCache>) -> Self {
        Self { pool, config, cache }
    }

    pub async fn create(&self, request: CreatePatRequest) -> Result<CreatedPat> {
        let scope_engine = ScopeEngine::new(self.pool, self.cache.clone());
        scope_engine
            .require(request.creator_user_id, request.creator_tenant_id, "apikeys:write")
            .await?;

        for scope in &request.scopes {
            if !scope_engine
                .check(request.creator_user_id, request.creator_tenant_id, scope)
                .await?
            {
                return Err(Error::forbidden(scope.clone()));
            }
        }

        let tree = TenantTree::new(self.pool);
        for tenant_id in &request.tenant_ids {
            if !tree.can_access(request.creator_user_id, *tenant_id).await? {
                return Err(Error::forbidden("tenants:read"));
            }
        }
        for agent_id in &request.agent_ids {
            let agent = AgentRepository::get(self.pool, *agent_id).await?;
            if !tree.can_access(request.creator_user_id, agent.tenant_id).await? {
                return Err(Error::forbidden("agents:read"));
            }
        }

        let token = new_pat_token();
        let token_prefix = token.chars().take(16).collect::<String>();
        let token_hash = hash_pat(&self.config.master_key, &token);

        let record = PatRepository::create(
            self.pool,
            request.creator_user_id,
            &request.name,
            &token_prefix,
            &token_hash,
            json!(request.scopes),
            json!(request.agent_ids),
            json!(request.tenant_ids),
            request.expires.resolve(),
        )
        .await?;

        Ok(CreatedPat { record, token })
    }

    /// Hash, fetch, reject revoked/expired, touch `last_used_at`.
    pub async fn validate(&self, raw_token: &str) -> Result<ValidatedPat> {
        let token_hash = hash_pat(&self.config.master_key, raw_token);
        let pat = PatRepository::find_by_hash(self.pool, &token_hash)
            .await?
            .ok_or_else(|| Error::unauthenticated("invalid token"))?;

        if pat.is_revoked {
            return Err(Error::unauthenticated("revoked"));
        }
        if let Some(expires_at) = pat.expires_at {
            if expires_at <= Utc::now() {
                return Err(Error::unauthenticated("expired"));
            }
        }

        PatRepository::touch_last_used(self.pool, pat.id).await?;

        Ok(ValidatedPat {
            user_id: pat.user_id,
            scopes: from_json_strings(&pat.scopes),
            agent_ids: from_json_uuids(&pat.agent_ids),
            tenant_ids: from_json_uuids(&pat.company_ids),
            token_name: pat.name,
        })
    }

    /// Revoke-and-mint in one step: same settings, new hash, same id stays
    /// terminal (the old row is revoked; a fresh row is returned).
    pub async fn regenerate(&self, pat_id: Uuid) -> Result<CreatedPat> {
        let existing = PatRepository::get(self.pool, pat_id).await?;
        PatRepository::revoke(self.pool, pat_id).await?;

        let token = new_pat_token();
        let token_prefix = token.chars().take(16).collect::<String>();
        let token_hash = hash_pat(&self.config.master_key, &token);

        let record = PatRepository::create(
            self.pool,
            existing.user_id,
            &existing.name,
            &token_prefix,
            &token_hash,
            existing.scopes,
            existing.agent_ids,
            existing.company_ids,
            existing.expires_at,
        )
        .await?;

        Ok(CreatedPat { record, token })
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<PersonalAccessToken>> {
        PatRepository::list_for_user(self.pool, user_id).await
    }

    pub async fn get(&self, pat_id: Uuid) -> Result<PersonalAccessToken> {
        PatRepository::get(self.pool, pat_id).await
    }

    pub async fn revoke(&self, pat_id: Uuid) -> Result<PersonalAccessToken> {
        PatRepository::revoke(self.pool, pat_id).await
    }
}

fn from_json_strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}

fn from_json_uuids(value: &serde_json::Value) -> Vec<Uuid> {
    value
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiration_shorthand_parses() {
        assert!(matches!(ExpirationSpec::parse("1_day").unwrap(), ExpirationSpec::OneDay));
        assert!(matches!(ExpirationSpec::parse("never").unwrap(), ExpirationSpec::Never));
        assert!(ExpirationSpec::parse("garbage").is_err());
    }

    #[test]
    fn never_resolves_to_none() {
        assert!(ExpirationSpec::Never.resolve().is_none());
    }

    #[test]
    fn one_day_resolves_to_future() {
        let resolved = ExpirationSpec::OneDay.resolve().unwrap();
        assert!(resolved > Utc::now());
    }
}
