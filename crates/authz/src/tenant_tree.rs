//! TenantTree (C5): parent/child tenant lookup, cycle-safe root-ancestor
//! resolution and descendant enumeration.

use crate::repositories::{MembershipRepository, TenantRepository};
use shared::error::{Error, Result};
use shared::models::Tenant;
use shared::DbPool;
use std::collections::HashSet;
use uuid::Uuid;

pub struct TenantTree<'a> {
    pool: &'a DbPool,
}

impl<'a> TenantTree<'a> {
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Walk `parent_id` up to the topmost ancestor. Aborts with
    /// `Error::Conflict` naming the cycle if a tenant is revisited.
    pub async fn root(&self, tenant_id: Uuid) -> Result<Tenant> {
        let mut visited = HashSet::new();
        let mut current = TenantRepository::get(self.pool, tenant_id).await?;

        loop {
            if !visited.insert(current.id) {
                return Err(Error::conflict(format!(
                    "tenant cycle detected while resolving root of {tenant_id}"
                )));
            }

            match current.parent_id {
                Some(parent_id) => {
                    current = TenantRepository::get(self.pool, parent_id).await?;
                }
                None => return Ok(current),
            }
        }
    }

    /// DFS over children, cycle-safe via a visited set.
    pub async fn descendants(&self, tenant_id: Uuid) -> Result<Vec<Tenant>> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut stack = vec![tenant_id];

        while let Some(current_id) = stack.pop() {
            if !visited.insert(current_id) {
                continue;
            }

            let children = TenantRepository::children(self.pool, current_id).await?;
            for child in children {
                stack.push(child.id);
                result.push(child);
            }
        }

        Ok(result)
    }

    /// Single source of truth for cross-tenant reach: direct membership OR
    /// admin (role <= 1) of any ancestor.
    pub async fn can_access(&self, user_id: Uuid, tenant_id: Uuid) -> Result<bool> {
        if MembershipRepository::find(self.pool, user_id, tenant_id)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        let admin_memberships = MembershipRepository::admin_memberships_for_user(self.pool, user_id).await?;
        if admin_memberships.is_empty() {
            return Ok(false);
        }

        let mut visited = HashSet::new();
        let mut ancestor = TenantRepository::get(self.pool, tenant_id).await?;
        loop {
            if admin_memberships.iter().any(|m| m.tenant_id == ancestor.id) {
                return Ok(true);
            }
            if !visited.insert(ancestor.id) {
                return Ok(false);
            }
            match ancestor.parent_id {
                Some(parent_id) => {
                    ancestor = TenantRepository::get(self.pool, parent_id).await?;
                }
                None => return Ok(false),
            }
        }
    }
}
