use shared::error::Result;
use shared::models::{CustomRole, CustomRoleScope, DefaultRoleScope, UserCustomRole};
use shared::DbPool;
use uuid::Uuid;

pub struct ScopeRepository;

impl ScopeRepository {
    pub async fn default_scopes_for_role(pool: &DbPool, role_id: i32) -> Result<Vec<String>> {
        let rows = sqlx::query_as::<_, DefaultRoleScope>(
            r#"SELECT * FROM default_role_scopes WHERE role_id = $1"#,
        )
        .bind(role_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.scope).collect())
    }

    /// Active custom roles assigned to (user, tenant), plus the scopes they
    /// carry.
    pub async fn active_custom_role_scopes(
        pool: &DbPool,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<String>> {
        let assignments = sqlx::query_as::<_, UserCustomRole>(
            r#"SELECT * FROM user_custom_roles WHERE user_id = $1 AND tenant_id = $2"#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        let mut scopes = Vec::new();
        for assignment in assignments {
            let role = sqlx::query_as::<_, CustomRole>(
                r#"SELECT * FROM custom_roles WHERE id = $1 AND is_active = true"#,
            )
            .bind(assignment.custom_role_id)
            .fetch_optional(pool)
            .await?;

            let Some(role) = role else { continue };

            let role_scopes = sqlx::query_as::<_, CustomRoleScope>(
                r#"SELECT * FROM custom_role_scopes WHERE custom_role_id = $1"#,
            )
            .bind(role.id)
            .fetch_all(pool)
            .await?;

            scopes.extend(role_scopes.into_iter().map(|s| s.scope));
        }

        Ok(scopes)
    }
}
