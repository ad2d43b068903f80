//! AuthSession (C7): bearer validation (API key, JWT, PAT), caching,
//! blacklist lookup, superadmin promotion.
//!
//! `resolve` is the only method the api-gateway's hot `/v1/user` path calls;
//! it builds one consolidated `UserProfile` using batch prefetches (role
//! scopes, custom scopes, extension-wildcard expansion) the way the
//! teacher's `AuthExtractor` middleware batches its organization-plan
//! lookup (see SPEC_FULL.md §4.7).

use crate::crypto::jwt;
use crate::pat_manager::PatManager;
use crate::repositories::BlacklistRepository;
use authz::repositories::{AgentRepository, MembershipRepository};
use authz::ScopeEngine;
use billing::BillingGate;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared::cache::{keys, ttl, SharedCache, SharedCacheExt};
use shared::config::{BillingConfig, ServerConfig};
use shared::error::{Error, Result};
use shared::models::{Agent, Membership, User};
use shared::DbPool;
use std::sync::Arc;
use uuid::Uuid;

/// The three accepted bearer-credential forms (spec.md §6).
#[derive(Debug, Clone)]
pub enum BearerCredential {
    MasterKey,
    Pat(String),
    Jwt(String),
}

/// Strip an optional leading `Bearer ` prefix and classify the credential.
pub fn parse_bearer(header: &str, master_key: &str) -> BearerCredential {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token == master_key {
        BearerCredential::MasterKey
    } else if token.starts_with("agixt_") {
        BearerCredential::Pat(token.to_string())
    } else {
        BearerCredential::Jwt(token.to_string())
    }
}

/// Restrictions an ephemeral PAT layers on top of the user's own scopes;
/// never attached to the `User` entity itself (REDESIGN FLAGS: dynamic
/// attribute assignment on hydrated rows -> carried in this value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatRestriction {
    pub scopes: Vec<String>,
    pub agent_ids: Vec<Uuid>,
    pub tenant_ids: Vec<Uuid>,
    pub token_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipProfile {
    pub tenant_id: Uuid,
    pub role_id: i32,
    pub scopes: Vec<String>,
    pub agents: Vec<Agent>,
}

/// Paywall status attached to the profile so the caller doesn't need a
/// second `BillingGate::check` round-trip on the hot path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaywallStatus {
    Granted,
    PaymentRequired {
        wallet_address: Option<String>,
        price_per_million_usd: f64,
    },
}

/// One consolidated profile: preferences, memberships with scope lists,
/// per-tenant agent list, and paywall status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: User,
    pub memberships: Vec<MembershipProfile>,
    pub paywall: PaywallStatus,
    pub pat_restriction: Option<PatRestriction>,
}

impl UserProfile {
    /// Effective scope set for `tenant_id`: the user's own granted set,
    /// intersected with the PAT's restriction list when the credential was
    /// a PAT (spec.md §4.10 — "effective scope set is the intersection").
    pub fn effective_scopes(&self, tenant_id: Uuid) -> Vec<String> {
        let own = self
            .memberships
            .iter()
            .find(|m| m.tenant_id == tenant_id)
            .map(|m| m.scopes.clone())
            .unwrap_or_default();

        match &self.pat_restriction {
            None => own,
            Some(restriction) => own
                .into_iter()
                .filter(|s| restriction.scopes.contains(s))
                .collect(),
        }
    }

    pub fn agent_allowed(&self, tenant_id: Uuid, agent_id: Uuid) -> bool {
        match &self.pat_restriction {
            None => true,
            Some(restriction) => {
                restriction.tenant_ids.contains(&tenant_id) && restriction.agent_ids.contains(&agent_id)
            }
        }
    }
}

/// Synthetic identity bound to the process master key (spec.md §4.7 step 1).
fn synthetic_admin_user() -> User {
    User {
        id: Uuid::nil(),
        email: "master@local".to_string(),
        mfa_seed: String::new(),
        verify_mfa: true,
        is_active: true,
        created_at: Utc::now(),
    }
}

pub struct AuthSession<'a> {
    pool: &'a DbPool,
    cache: Arc<dyn SharedCache>,
    server_config: &'a ServerConfig,
    billing_config: &'a BillingConfig,
}

impl<'a> AuthSession<'a> {
    pub fn new(
        pool: &'a DbPool,
        cache: Arc<dyn SharedCache>,
        server_config: &'a ServerConfig,
        billing_config: &'a BillingConfig,
    ) -> Self {
        Self {
            pool,
            cache,
            server_config,
            billing_config,
        }
    }

    /// Resolve a raw bearer token (already stripped of the `Bearer ` prefix
    /// upstream, or not — `parse_bearer` handles both) into a full profile.
    pub async fn resolve(&self, credential: BearerCredential) -> Result<UserProfile> {
        match credential {
            BearerCredential::MasterKey => Ok(UserProfile {
                user: synthetic_admin_user(),
                memberships: Vec::new(),
                paywall: PaywallStatus::Granted,
                pat_restriction: None,
            }),
            BearerCredential::Pat(raw) => self.resolve_pat(&raw).await,
            BearerCredential::Jwt(raw) => self.resolve_jwt(&raw).await,
        }
    }

    async fn resolve_pat(&self, raw_token: &str) -> Result<UserProfile> {
        let pat_manager = PatManager::new(self.pool, self.server_config, self.cache.clone());
        let validated = pat_manager.validate(raw_token).await?;

        let mut profile = self.hydrate(validated.user_id).await?;
        profile.pat_restriction = Some(PatRestriction {
            scopes: validated.scopes,
            agent_ids: validated.agent_ids,
            tenant_ids: validated.tenant_ids,
            token_name: validated.token_name,
        });
        Ok(profile)
    }

    async fn resolve_jwt(&self, token: &str) -> Result<UserProfile> {
        if BlacklistRepository::exists(self.pool, token).await? {
            return Err(Error::unauthenticated("revoked"));
        }

        let token_hash = hex::encode(Sha256::digest(token.as_bytes()));
        let cache_key = keys::token_validation(&token_hash);

        let claims = if let Some(cached) = self.cache.get::<jwt::Claims>(&cache_key).await? {
            cached
        } else {
            let claims = jwt::decode_claims(&self.server_config.jwt_secret, token)?;
            self.cache.set(&cache_key, &claims, ttl::TOKEN_VALIDATION).await?;
            claims
        };

        self.hydrate(claims.sub).await
    }

    /// Batch-build the consolidated profile for an already-authenticated
    /// user id: memberships, per-tenant expanded scopes, per-tenant agent
    /// list, and paywall status, plus `SUPERADMIN_EMAIL` promotion.
    async fn hydrate(&self, user_id: Uuid) -> Result<UserProfile> {
        let mut user = crate::repositories::UserRepository::get(self.pool, user_id).await?;

        if let Some(superadmin_email) = &self.server_config.superadmin_email {
            if user.email.eq_ignore_ascii_case(superadmin_email) {
                self.promote_to_superadmin(user_id).await?;
            }
        }

        let memberships = MembershipRepository::find_all_for_user(self.pool, user_id).await?;
        let scope_engine = ScopeEngine::new(self.pool, self.cache.clone());

        let mut profiles = Vec::with_capacity(memberships.len());
        for membership in &memberships {
            let scopes = scope_engine
                .expanded_scopes(user_id, membership.tenant_id)
                .await?;
            let agents = AgentRepository::list_for_tenant(self.pool, membership.tenant_id).await?;
            profiles.push(MembershipProfile {
                tenant_id: membership.tenant_id,
                role_id: membership.role_id,
                scopes,
                agents,
            });
        }

        let paywall = self.paywall_status(&memberships).await?;

        if !user.is_active {
            user = crate::repositories::UserRepository::get(self.pool, user_id).await?;
        }

        Ok(UserProfile {
            user,
            memberships: profiles,
            paywall,
            pat_restriction: None,
        })
    }

    /// A user with no memberships has nothing to pay for; otherwise the
    /// least-privileged tenant's gate wins (first failure short-circuits).
    async fn paywall_status(&self, memberships: &[Membership]) -> Result<PaywallStatus> {
        if memberships.is_empty() {
            return Ok(PaywallStatus::Granted);
        }

        let billing_gate = BillingGate::new(self.pool, self.billing_config);
        for membership in memberships {
            if membership.role_id == Membership::ROLE_SUPER_ADMIN {
                continue;
            }
            match billing_gate.check(membership.user_id, membership.tenant_id).await {
                Ok(()) => continue,
                Err(Error::PaymentRequired {
                    wallet_address,
                    price_per_million_usd,
                }) => {
                    return Ok(PaywallStatus::PaymentRequired {
                        wallet_address,
                        price_per_million_usd,
                    })
                }
                Err(e) => return Err(e),
            }
        }
        Ok(PaywallStatus::Granted)
    }

    /// Runs on first sight and on every session refresh, per spec.md §3's
    /// `SUPERADMIN_EMAIL` invariant: forces role 0 in every tenant the user
    /// has joined.
    async fn promote_to_superadmin(&self, user_id: Uuid) -> Result<()> {
        let memberships = MembershipRepository::find_all_for_user(self.pool, user_id).await?;
        let scope_engine = ScopeEngine::new(self.pool, self.cache.clone());
        for membership in memberships {
            if membership.role_id != Membership::ROLE_SUPER_ADMIN {
                MembershipRepository::update_role(
                    self.pool,
                    user_id,
                    membership.tenant_id,
                    Membership::ROLE_SUPER_ADMIN,
                )
                .await?;
                scope_engine.invalidate(user_id, membership.tenant_id).await?;
            }
        }
        Ok(())
    }

    /// Rate-limited (TTL 300s) background Stripe-subscription check,
    /// spawned off the hot path. `checker` is the externally-owned
    /// `PaymentBackend` capability (out of scope per spec.md §1); this
    /// method only owns the rate-limiting and the `User.is_active` flip
    /// the check is gated on. Cached per-tenant since the subscription is a
    /// tenant-level billing fact, even though the bit it flips lives on the
    /// user row that tenant's check authorized.
    pub async fn spawn_subscription_check<F, Fut>(&self, user_id: Uuid, tenant_id: Uuid, checker: F)
    where
        F: FnOnce(Uuid) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<bool>> + Send + 'static,
    {
        let cache_key = keys::stripe_check(tenant_id);
        if matches!(self.cache.get::<bool>(&cache_key).await, Ok(Some(_))) {
            return;
        }
        let _ = self.cache.set(&cache_key, &true, ttl::STRIPE_CHECK).await;

        let pool = self.pool.clone();
        tokio::spawn(async move {
            match checker(tenant_id).await {
                Ok(has_valid_subscription) if has_valid_subscription => {
                    if let Err(e) =
                        crate::repositories::UserRepository::set_active(&pool, user_id, true).await
                    {
                        tracing::warn!(error = %e, "failed to reactivate user after subscription check");
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "background subscription check failed"),
            }
        });
    }
}
