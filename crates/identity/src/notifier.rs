//! Email/SMS delivery capability (out of scope per spec.md §1). MagicLink
//! (C8) and Invitations (C11) depend only on this trait, never on a concrete
//! transport, mirroring the teacher's `McpClient` seam in
//! `action-workers/src/mcp.rs`.

use async_trait::async_trait;
use shared::error::Result;

/// A single outbound message. `html_body` is optional; transports that only
/// support plain text may ignore it.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<()>;
}
