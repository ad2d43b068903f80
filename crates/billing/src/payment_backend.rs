//! Stripe/wallet payment collection capability (out of scope per spec.md
//! §1). `AuthSession`'s background subscription check depends only on this
//! trait, mirroring the teacher's `McpClient` seam in
//! `action-workers/src/mcp.rs`.

use async_trait::async_trait;
use shared::error::Result;
use uuid::Uuid;

#[async_trait]
pub trait PaymentBackend: Send + Sync {
    /// True if `tenant_id`'s root ancestor currently holds a valid,
    /// non-lapsed subscription or on-chain payment.
    async fn has_active_subscription(&self, tenant_id: Uuid) -> Result<bool>;
}
