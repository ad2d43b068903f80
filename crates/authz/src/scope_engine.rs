//! ScopeEngine (C4): evaluates scope strings against a user's granted set,
//! including wildcard and `ext:*` expansion keyed on tenant-installed
//! extensions.

use crate::repositories::{ExtensionRepository, MembershipRepository, ScopeRepository, TenantRepository};
use crate::scope_pattern::ScopePattern;
use shared::cache::{keys, ttl, SharedCache, SharedCacheExt};
use shared::error::{Error, Result};
use shared::models::Membership;
use shared::DbPool;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

pub struct ScopeEngine<'a> {
    pool: &'a DbPool,
    cache: Arc<dyn SharedCache>,
}

impl<'a> ScopeEngine<'a> {
    pub fn new(pool: &'a DbPool, cache: Arc<dyn SharedCache>) -> Self {
        Self { pool, cache }
    }

    /// Resolve the user's effective role in `tenant_id`: direct membership,
    /// or the role of the nearest ancestor where the user is an admin
    /// (`role_id <= 1`), per spec.md §4.4 step 1.
    pub async fn effective_role(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Option<i32>> {
        if let Some(membership) = MembershipRepository::find(self.pool, user_id, tenant_id).await? {
            return Ok(Some(membership.role_id));
        }

        let admin_memberships: Vec<Membership> =
            MembershipRepository::admin_memberships_for_user(self.pool, user_id).await?;
        if admin_memberships.is_empty() {
            return Ok(None);
        }

        let mut visited = HashSet::new();
        let mut current = TenantRepository::get(self.pool, tenant_id).await?;
        loop {
            if let Some(admin) = admin_memberships.iter().find(|m| m.tenant_id == current.id) {
                return Ok(Some(admin.role_id));
            }
            if !visited.insert(current.id) {
                return Ok(None);
            }
            match current.parent_id {
                Some(parent_id) => current = TenantRepository::get(self.pool, parent_id).await?,
                None => return Ok(None),
            }
        }
    }

    /// Assemble the expanded scope set for (user, tenant) per spec.md §4.4
    /// step 3, using the cache as a 60s hint.
    pub async fn expanded_scopes(&self, user_id: Uuid, tenant_id: Uuid) -> Result<Vec<String>> {
        let cache_key = keys::user_scopes(user_id, tenant_id);
        if let Some(cached) = self.cache.get::<Vec<String>>(&cache_key).await? {
            return Ok(cached);
        }

        let Some(role_id) = self.effective_role(user_id, tenant_id).await? else {
            return Ok(Vec::new());
        };

        let mut scopes = ScopeRepository::default_scopes_for_role(self.pool, role_id).await?;
        scopes.extend(ScopeRepository::active_custom_role_scopes(self.pool, user_id, tenant_id).await?);

        let had_ext_wildcard = scopes.iter().any(|s| s == "ext:*");
        if had_ext_wildcard {
            // Drop the literal "ext:*" grant and replace it with one
            // per-extension pattern per tenant-installed extension, so a
            // tenant without an extension configured never matches it.
            scopes.retain(|s| s != "ext:*");
            let installed = ExtensionRepository::installed_extension_names(self.pool, tenant_id).await?;
            scopes.extend(installed.into_iter().map(|name| format!("ext:{name}:*")));
        }

        self.cache.set(&cache_key, &scopes, ttl::USER_SCOPES).await?;
        Ok(scopes)
    }

    /// Evaluate `query` against the user's granted set with the precedence
    /// order in spec.md §4.4 step 4. Super-admins short-circuit to granted.
    pub async fn check(&self, user_id: Uuid, tenant_id: Uuid, query: &str) -> Result<bool> {
        if self.effective_role(user_id, tenant_id).await? == Some(Membership::ROLE_SUPER_ADMIN) {
            return Ok(true);
        }

        let granted = self.expanded_scopes(user_id, tenant_id).await?;
        let query_pattern = ScopePattern::parse(query)?;
        Ok(granted.iter().any(|candidate| {
            ScopePattern::parse(candidate)
                .map(|granted_pattern| matches(&granted_pattern, &query_pattern))
                .unwrap_or(false)
        }))
    }

    pub async fn has_any(&self, user_id: Uuid, tenant_id: Uuid, queries: &[&str]) -> Result<bool> {
        for query in queries {
            if self.check(user_id, tenant_id, query).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn has_all(&self, user_id: Uuid, tenant_id: Uuid, queries: &[&str]) -> Result<bool> {
        for query in queries {
            if !self.check(user_id, tenant_id, query).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn require(&self, user_id: Uuid, tenant_id: Uuid, query: &str) -> Result<()> {
        if self.check(user_id, tenant_id, query).await? {
            Ok(())
        } else {
            Err(Error::forbidden(query))
        }
    }

    /// Invalidate the cached scope set for (user, tenant); also called on
    /// role change, custom-role change, or tenant-extension change.
    pub async fn invalidate(&self, user_id: Uuid, tenant_id: Uuid) -> Result<()> {
        self.cache.delete(&keys::user_scopes(user_id, tenant_id)).await
    }
}

/// `granted` is a pattern already on the user's expanded set; `query` is the
/// exact scope string being checked. Implements the full precedence table
/// of spec.md §4.4 step 4.
fn matches(granted: &ScopePattern, query: &ScopePattern) -> bool {
    use ScopePattern::*;

    if granted == query {
        return true;
    }

    match granted {
        GlobalWildcard => true,
        ResourceWildcard { resource: gr } => matches!(
            query,
            ResourceAction { resource: qr, .. } if qr == gr
        ),
        ExtWildcard => matches!(query, ExtNameAction { .. } | ExtNameFeatureAction { .. }),
        ExtWildcardAction { action: ga } => matches!(
            query,
            ExtNameAction { action: qa, .. } if qa == ga
        ) || matches!(
            query,
            ExtNameFeatureAction { action: qa, .. } if qa == ga
        ),
        ExtNameWildcard { name: gn } => matches!(
            query,
            ExtNameAction { name: qn, .. } if qn == gn
        ) || matches!(
            query,
            ExtNameFeatureAction { name: qn, .. } if qn == gn
        ),
        // ext:name:action shorthand also covers ext:name:execute / ext:name:read
        ExtNameAction { name: gn, action: ga } => match query {
            ExtNameFeatureAction { name: qn, action: qa, .. } => {
                qn == gn && (qa == ga || ga == "execute" || ga == "read")
            }
            _ => false,
        },
        ExtNameFeatureAction { .. } | ResourceAction { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(s: &str) -> ScopePattern {
        ScopePattern::parse(s).unwrap()
    }

    #[test]
    fn exact_match() {
        assert!(matches(&pat("tenants:read"), &pat("tenants:read")));
    }

    #[test]
    fn global_wildcard_matches_everything() {
        assert!(matches(&pat("*"), &pat("tenants:read")));
        assert!(matches(&pat("*"), &pat("ext:github:issues:write")));
    }

    #[test]
    fn resource_wildcard() {
        assert!(matches(&pat("tenants:*"), &pat("tenants:write")));
        assert!(!matches(&pat("tenants:*"), &pat("users:write")));
    }

    #[test]
    fn ext_wildcard_precedence_chain() {
        assert!(matches(&pat("ext:*"), &pat("ext:github:read")));
        assert!(matches(&pat("ext:*:read"), &pat("ext:github:read")));
        assert!(matches(&pat("ext:github:*"), &pat("ext:github:write")));
    }

    #[test]
    fn feature_scoped_ext_precedence() {
        assert!(matches(&pat("ext:*:issues:write"), &pat("ext:github:issues:write")));
        assert!(matches(&pat("ext:*:*:write"), &pat("ext:github:issues:write")));
        assert!(matches(&pat("ext:github:issues:*"), &pat("ext:github:issues:write")));
        assert!(matches(&pat("ext:github:*:write"), &pat("ext:github:issues:write")));
    }

    #[test]
    fn ext_name_action_shorthand_covers_execute_and_read() {
        assert!(matches(&pat("ext:github:execute"), &pat("ext:github:issues:execute")));
        assert!(matches(&pat("ext:github:read"), &pat("ext:github:issues:read")));
        assert!(!matches(&pat("ext:github:write"), &pat("ext:github:issues:delete")));
    }

    #[test]
    fn unrelated_patterns_do_not_match() {
        assert!(!matches(&pat("tenants:read"), &pat("tenants:write")));
        assert!(!matches(&pat("ext:github:*"), &pat("ext:slack:read")));
    }
}
