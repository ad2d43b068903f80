//! Invitations (C11): issue/accept tenant invitations. Acceptance is one
//! transaction: create-or-reactivate the user, create the Membership, mark
//! the invitation spent, and provision the tenant's default agent.

use authz::repositories::{AgentRepository, TenantRepository};
use authz::ScopeEngine;
use shared::cache::SharedCache;
use shared::error::{Error, Result};
use shared::models::{Invitation, Membership};
use shared::DbPool;
use std::sync::Arc;
use uuid::Uuid;

pub struct Invitations<'a> {
    pool: &'a DbPool,
    cache: Arc<dyn SharedCache>,
}

impl<'a> Invitations<'a> {
    pub fn new(pool: &'a DbPool, cache: Arc<dyn SharedCache>) -> Self {
        Self { pool, cache }
    }

    /// Issue an invitation for `email` into `tenant_id` at `role_id`.
    /// Requires `users:write` on the tenant (direct or via an admin
    /// ancestor, which `ScopeEngine::check` already resolves); the assigned
    /// role must not outrank the inviter's own.
    pub async fn issue(
        &self,
        inviter_id: Uuid,
        tenant_id: Uuid,
        email: &str,
        role_id: i32,
    ) -> Result<Invitation> {
        let scope_engine = ScopeEngine::new(self.pool, self.cache.clone());
        scope_engine.require(inviter_id, tenant_id, "users:write").await?;

        let inviter_role = scope_engine
            .effective_role(inviter_id, tenant_id)
            .await?
            .ok_or_else(|| Error::forbidden("users:write"))?;

        if role_id < inviter_role {
            return Err(Error::forbidden("cannot assign a role above your own"));
        }

        crate::repositories::InvitationRepository::create(self.pool, email, tenant_id, role_id, inviter_id)
            .await
    }

    /// Accept `invitation_id`. Idempotent on an already-accepted invitation
    /// (returns `conflict` rather than silently creating a second
    /// Membership).
    pub async fn accept(&self, invitation_id: Uuid) -> Result<Membership> {
        let invitation = crate::repositories::InvitationRepository::get(self.pool, invitation_id).await?;
        if invitation.is_accepted {
            return Err(Error::conflict("invitation already accepted"));
        }

        let mut tx = self.pool.begin().await?;

        let user = match crate::repositories::UserRepository::find_by_email(self.pool, &invitation.email).await? {
            Some(user) if !user.is_active => {
                crate::repositories::UserRepository::set_active_with_executor(&mut *tx, user.id, true).await?
            }
            Some(user) => user,
            None => {
                let seed = crate::crypto::generate_seed();
                let user =
                    crate::repositories::UserRepository::create_with_executor(&mut *tx, &invitation.email, &seed)
                        .await?;
                crate::repositories::UserRepository::set_active_with_executor(&mut *tx, user.id, true).await?
            }
        };

        let membership = authz::repositories::MembershipRepository::create_with_executor(
            &mut *tx,
            user.id,
            invitation.tenant_id,
            invitation.role_id,
        )
        .await?;

        crate::repositories::InvitationRepository::mark_accepted_with_executor(&mut *tx, invitation_id).await?;

        let tenant = TenantRepository::get(self.pool, invitation.tenant_id).await?;
        if AgentRepository::find_by_tenant_and_name(self.pool, invitation.tenant_id, &tenant.agent_name)
            .await?
            .is_none()
        {
            AgentRepository::create_with_executor(&mut *tx, invitation.tenant_id, &tenant.agent_name, None)
                .await?;
        }

        tx.commit().await?;

        let scope_engine = ScopeEngine::new(self.pool, self.cache.clone());
        scope_engine.invalidate(user.id, invitation.tenant_id).await?;

        Ok(membership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_comparison_rejects_outranking_assignment() {
        let inviter_role = Membership::ROLE_COMPANY_ADMIN;
        let requested_role = Membership::ROLE_SUPER_ADMIN;
        assert!(requested_role < inviter_role);
    }
}
