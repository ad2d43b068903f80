//! Entity models matching the PostgreSQL schema
//!
//! Row structs mirror the tables described by the orchestration substrate's
//! data model: identity, tenancy, authorization, billing and chain-execution
//! state. Secret-bearing fields are never serialized back to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A registered user. Deletion is soft (`is_active = false`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub mfa_seed: String,
    pub verify_mfa: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A tenant ("company"). `parent_id` is nullable and forms a forest.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub agent_name: String,
    pub token_balance: i64,
    pub token_balance_usd: f64,
    pub tokens_used_total: i64,
    pub user_limit: i32,
    pub last_low_balance_warning: Option<DateTime<Utc>>,
    /// `tokens_used_total` snapshot taken the last time a low-balance
    /// warning fired, so a later warning only re-fires once consumption
    /// has advanced by at least `TOKEN_WARNING_INCREMENT` tokens.
    pub last_low_balance_warning_tokens_used: Option<i64>,
    pub training_data: Option<String>,
    /// true when the tenant is suspended
    pub status: bool,
    pub pricing_mode: PricingMode,
    pub token_price_per_million_usd: f64,
    pub created_at: DateTime<Utc>,
}

/// Pricing model a tenant's root ancestor is billed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    PerToken,
    PerUser,
    PerCapacity,
    PerLocation,
}

/// A user's membership in a tenant. At most one row per (user, tenant).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    /// 0 = super-admin, 1 = tenant-admin, 2 = company-admin, 3+ = user
    pub role_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Membership {
    pub const ROLE_SUPER_ADMIN: i32 = 0;
    pub const ROLE_TENANT_ADMIN: i32 = 1;
    pub const ROLE_COMPANY_ADMIN: i32 = 2;
    pub const ROLE_USER: i32 = 3;

    pub fn is_admin(&self) -> bool {
        self.role_id <= Self::ROLE_TENANT_ADMIN
    }
}

/// Scope linked to a role by default (`DefaultRoleScope`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DefaultRoleScope {
    pub id: Uuid,
    pub role_id: i32,
    pub scope: String,
}

/// A tenant-scoped custom role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomRole {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Scope granted by a custom role.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomRoleScope {
    pub id: Uuid,
    pub custom_role_id: Uuid,
    pub scope: String,
}

/// Assignment of a custom role to a (user, tenant) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserCustomRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub custom_role_id: Uuid,
}

/// Revoked JWT. Expired rows are purged by a maintenance task.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenBlacklist {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Personal access token. Raw value is returned once at creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PersonalAccessToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    /// First 16 chars of the token, shown in listings.
    pub token_prefix: String,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub scopes: serde_json::Value,
    pub agent_ids: serde_json::Value,
    pub company_ids: serde_json::Value,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_revoked: bool,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Stored OAuth credential for a (user, provider) pair.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserOAuth {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: String,
    pub account_name: Option<String>,
    #[serde(skip_serializing)]
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
}

/// A pending invitation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invitation {
    pub id: Uuid,
    pub email: String,
    pub tenant_id: Uuid,
    pub role_id: i32,
    pub inviter_id: Uuid,
    pub is_accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// Append-only token usage ledger row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TokenUsage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub ts: DateTime<Utc>,
}

/// An agent, scoped to a tenant, resolvable by `@mention` (C12).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Agent {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub provider_id: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Extension command installed for a tenant (drives `ext:*` expansion).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyExtensionCommand {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub extension_name: String,
    pub command_name: String,
    pub enabled: bool,
}

/// Extension setting installed for a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyExtensionSetting {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub extension_name: String,
    pub setting_name: String,
    #[serde(skip_serializing)]
    pub setting_value: String,
}

/// A structural chain definition (ordered list of steps).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Chain {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One step of a chain.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Step {
    pub id: Uuid,
    pub chain_id: Uuid,
    pub step_number: i32,
    pub agent_name: String,
    pub prompt_type: PromptType,
    pub prompt_args: serde_json::Value,
    pub run_next_concurrent: bool,
}

/// Kind of a chain step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "PascalCase")]
#[serde(rename_all = "PascalCase")]
pub enum PromptType {
    Prompt,
    Command,
    Chain,
}

/// Execution-ledger row for one run of a chain (expanded — §3 authoritative
/// DB representation per the Open Questions resolution).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChainRun {
    pub id: Uuid,
    pub chain_id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub status: ChainRunStatus,
    pub from_step: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// ChainRun lifecycle: `pending -> running -> (completed|failed|cancelled)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChainRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Per-step output recorded by a ChainRun, substitutable into later
/// `{STEPk}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StepResponse {
    pub id: Uuid,
    pub chain_run_id: Uuid,
    pub step_number: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Conversation grouping for messages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub conversation_type: ConversationType,
    pub parent_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Conversation kind; `dm` conversations block agent auto-response (C12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversationType {
    Single,
    Dm,
    Thread,
}

/// A message within a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
