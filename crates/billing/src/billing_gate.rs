//! BillingGate (C6): pricing-mode evaluation, balance check, usage debit
//! routed to the root ancestor, low-balance warnings, seat/location limits.

use crate::repositories::UsageLedgerRepository;
use authz::repositories::{MembershipRepository, TenantRepository};
use authz::TenantTree;
use shared::config::BillingConfig;
use shared::error::{Error, Result};
use shared::models::{Membership, PricingMode, Tenant};
use shared::DbPool;
use uuid::Uuid;

pub struct BillingGate<'a> {
    pool: &'a DbPool,
    config: &'a BillingConfig,
}

impl<'a> BillingGate<'a> {
    pub fn new(pool: &'a DbPool, config: &'a BillingConfig) -> Self {
        Self { pool, config }
    }

    async fn is_super_admin(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool> {
        Ok(MembershipRepository::find(self.pool, user_id, tenant_id)
            .await?
            .map(|m| m.role_id == Membership::ROLE_SUPER_ADMIN)
            .unwrap_or(false))
    }

    /// Called on the auth hot-path. Returns `Ok(())` when granted, otherwise
    /// `Error::PaymentRequired`.
    pub async fn check(&self, user_id: Uuid, tenant_id: Uuid) -> Result<()> {
        if self.is_super_admin(user_id, tenant_id).await? {
            return Ok(());
        }

        let tree = TenantTree::new(self.pool);
        let root = tree.root(tenant_id).await?;

        let granted = match root.pricing_mode {
            PricingMode::PerToken => {
                if root.token_price_per_million_usd > 0.0 {
                    root.token_balance > 0
                } else {
                    true
                }
            }
            PricingMode::PerUser => {
                let direct_members = MembershipRepository::count_for_tenant(self.pool, tenant_id).await?;
                direct_members < root.user_limit as i64 || root.token_balance > 0
            }
            PricingMode::PerCapacity => root.token_balance > 0 || root.user_limit > 0,
            PricingMode::PerLocation => {
                let descendants = tree.descendants(root.id).await?.len() as i32;
                descendants + 1 <= root.user_limit || root.token_balance > 0
            }
        };

        if granted {
            Ok(())
        } else {
            Err(self.payment_required_error(&root))
        }
    }

    /// `per_user` admission check for a prospective new membership in
    /// `tenant_id` (the direct tenant, not necessarily the root).
    pub async fn can_admit_member(&self, tenant_id: Uuid) -> Result<bool> {
        let tree = TenantTree::new(self.pool);
        let root = tree.root(tenant_id).await?;
        if root.pricing_mode != PricingMode::PerUser {
            return Ok(true);
        }
        let direct_members = MembershipRepository::count_for_tenant(self.pool, tenant_id).await?;
        Ok(direct_members < root.user_limit as i64 || root.token_balance > 0)
    }

    /// `per_location` admission check for a prospective new child tenant
    /// under `root_id`.
    pub async fn can_admit_child_tenant(&self, root_id: Uuid) -> Result<bool> {
        let tree = TenantTree::new(self.pool);
        let root = TenantRepository::get(self.pool, root_id).await?;
        if root.pricing_mode != PricingMode::PerLocation {
            return Ok(true);
        }
        let descendants = tree.descendants(root_id).await?.len() as i32;
        Ok(descendants + 1 <= root.user_limit || root.token_balance > 0)
    }

    /// Atomic debit + ledger insert. Fails with `PaymentRequired` if the
    /// root tenant's balance is less than the requested total.
    pub async fn debit(
        &self,
        user_id: Uuid,
        direct_tenant_id: Uuid,
        input_tokens: i64,
        output_tokens: i64,
    ) -> Result<()> {
        if self.is_super_admin(user_id, direct_tenant_id).await? {
            return Ok(());
        }

        let total = input_tokens + output_tokens;
        let tree = TenantTree::new(self.pool);
        let root = tree.root(direct_tenant_id).await?;

        let mut tx = self.pool.begin().await?;
        let locked = TenantRepository::get_for_update(&mut *tx, root.id).await?;

        if locked.token_balance < total {
            return Err(self.payment_required_error(&locked));
        }

        let new_balance = locked.token_balance - total;
        let cost_usd = total as f64 * locked.token_price_per_million_usd / 1_000_000.0;
        let new_balance_usd = locked.token_balance_usd - cost_usd;
        let new_tokens_used_total = locked.tokens_used_total + total;

        let warn = low_balance_warning(
            self.config,
            &Tenant {
                token_balance_usd: new_balance_usd,
                tokens_used_total: new_tokens_used_total,
                ..locked.clone()
            },
        );

        TenantRepository::update_with_executor(
            &mut *tx,
            locked.id,
            None,
            None,
            Some(new_balance),
            Some(new_balance_usd),
            Some(new_tokens_used_total),
            None,
            None,
            warn.then(chrono::Utc::now),
            warn.then_some(new_tokens_used_total),
        )
        .await?;

        UsageLedgerRepository::insert_with_executor(
            &mut *tx,
            direct_tenant_id,
            user_id,
            input_tokens,
            output_tokens,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// True when the root's balance is at or below the configured warning
    /// threshold and has fallen by at least `TOKEN_WARNING_INCREMENT`
    /// tokens since the last warning.
    pub fn low_balance_warning(&self, root: &Tenant) -> bool {
        low_balance_warning(self.config, root)
    }

    fn payment_required_error(&self, root: &Tenant) -> Error {
        Error::payment_required(
            self.config.payment_wallet_address.clone(),
            root.token_price_per_million_usd,
        )
    }
}

/// Free function so the warning rule can be unit-tested without a DB pool.
fn low_balance_warning(config: &BillingConfig, root: &Tenant) -> bool {
    if root.token_balance_usd > config.low_balance_warning_threshold {
        return false;
    }
    match root.last_low_balance_warning_tokens_used {
        Some(last) => root.tokens_used_total - last >= config.token_warning_increment,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BillingConfig {
        BillingConfig {
            low_balance_warning_threshold: 1.0,
            token_warning_increment: 100_000,
            payment_wallet_address: Some("0xabc".to_string()),
            stripe_secret_key: None,
            stripe_webhook_secret: None,
        }
    }

    fn tenant(balance_usd: f64, tokens_used_total: i64, last_warned: Option<i64>) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: "root".into(),
            parent_id: None,
            agent_name: "agent".into(),
            token_balance: 1_000,
            token_balance_usd: balance_usd,
            tokens_used_total,
            user_limit: 0,
            last_low_balance_warning: None,
            last_low_balance_warning_tokens_used: last_warned,
            training_data: None,
            status: false,
            pricing_mode: PricingMode::PerToken,
            token_price_per_million_usd: 1.0,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn warning_suppressed_above_threshold() {
        let cfg = config();
        let root = tenant(5.0, 0, None);
        assert!(!low_balance_warning(&cfg, &root));
    }

    #[test]
    fn warning_fires_first_time_below_threshold() {
        let cfg = config();
        let root = tenant(0.5, 50_000, None);
        assert!(low_balance_warning(&cfg, &root));
    }

    #[test]
    fn warning_suppressed_until_increment_elapses() {
        let cfg = config();
        let root = tenant(0.5, 150_000, Some(100_000));
        assert!(!low_balance_warning(&cfg, &root));
    }

    #[test]
    fn warning_fires_again_after_increment_elapses() {
        let cfg = config();
        let root = tenant(0.5, 250_000, Some(100_000));
        assert!(low_balance_warning(&cfg, &root));
    }
}
