use shared::error::Result;
use shared::DbPool;
use std::collections::HashSet;
use uuid::Uuid;

pub struct ExtensionRepository;

impl ExtensionRepository {
    /// Distinct extension names configured for a tenant, across both
    /// commands and settings tables, used to restrict `ext:*` expansion.
    pub async fn installed_extension_names(pool: &DbPool, tenant_id: Uuid) -> Result<HashSet<String>> {
        let mut names: HashSet<String> = sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT extension_name FROM company_extension_commands WHERE tenant_id = $1 AND enabled = true"#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

        let setting_names: Vec<String> = sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT extension_name FROM company_extension_settings WHERE tenant_id = $1"#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        names.extend(setting_names);
        Ok(names)
    }
}
