//! Conversation/Message storage (part of C2 Store, the dispatch-owned
//! slice). Messages are appended, never edited, and read back in timestamp
//! order per spec.md §5's total-ordering guarantee.

use shared::error::{Error, Result};
use shared::models::{Conversation, ConversationType, Message};
use shared::DbPool;
use uuid::Uuid;

pub struct ConversationRepository;

impl ConversationRepository {
    pub async fn get(pool: &DbPool, conversation_id: Uuid) -> Result<Conversation> {
        sqlx::query_as::<_, Conversation>(r#"SELECT * FROM conversations WHERE id = $1"#)
            .bind(conversation_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| Error::not_found("Conversation", conversation_id.to_string()))
    }

    /// Whether `conversation_id` is a `dm`, or a `thread` whose parent is a
    /// `dm` — the case AgentRouter (C12) refuses to auto-dispatch into.
    pub async fn is_dm_or_dm_thread(pool: &DbPool, conversation: &Conversation) -> Result<bool> {
        if conversation.conversation_type == ConversationType::Dm {
            return Ok(true);
        }
        if conversation.conversation_type == ConversationType::Thread {
            if let Some(parent_id) = conversation.parent_id {
                let parent = Self::get(pool, parent_id).await?;
                return Ok(parent.conversation_type == ConversationType::Dm);
            }
        }
        Ok(false)
    }

    pub async fn create(
        pool: &DbPool,
        tenant_id: Uuid,
        conversation_type: ConversationType,
        parent_id: Option<Uuid>,
    ) -> Result<Conversation> {
        sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, tenant_id, conversation_type, parent_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(tenant_id)
        .bind(conversation_type)
        .bind(parent_id)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
        .map_err(Error::from)
    }
}

pub struct MessageRepository;

impl MessageRepository {
    pub async fn append(pool: &DbPool, conversation_id: Uuid, role: &str, content: &str) -> Result<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(role)
        .bind(content)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await
        .map_err(Error::from)
    }

    pub async fn list_for_conversation(pool: &DbPool, conversation_id: Uuid) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            r#"SELECT * FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC"#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
        .map_err(Error::from)
    }

    /// The message this router inspects for `@mention` tokens (spec.md
    /// §4.12 step 1).
    pub async fn last_user_message(pool: &DbPool, conversation_id: Uuid) -> Result<Option<Message>> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1 AND role = 'user'
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(pool)
        .await
        .map_err(Error::from)
    }
}
