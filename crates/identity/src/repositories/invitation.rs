use shared::error::{Error, Result};
use shared::models::Invitation;
use shared::DbPool;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

pub struct InvitationRepository;

impl InvitationRepository {
    pub async fn create(
        pool: &DbPool,
        email: &str,
        tenant_id: Uuid,
        role_id: i32,
        inviter_id: Uuid,
    ) -> Result<Invitation> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (id, email, tenant_id, role_id, inviter_id, is_accepted, created_at)
            VALUES ($1, $2, $3, $4, $5, false, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.to_lowercase())
        .bind(tenant_id)
        .bind(role_id)
        .bind(inviter_id)
        .bind(chrono::Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    pub async fn find_by_id(pool: &DbPool, invitation_id: Uuid) -> Result<Option<Invitation>> {
        let invitation =
            sqlx::query_as::<_, Invitation>(r#"SELECT * FROM invitations WHERE id = $1"#)
                .bind(invitation_id)
                .fetch_optional(pool)
                .await?;

        Ok(invitation)
    }

    pub async fn get(pool: &DbPool, invitation_id: Uuid) -> Result<Invitation> {
        Self::find_by_id(pool, invitation_id)
            .await?
            .ok_or_else(|| Error::not_found("Invitation", invitation_id.to_string()))
    }

    /// Pending (not yet accepted) invitations for an email, most recent
    /// first, so callers can treat the newest as authoritative.
    pub async fn find_pending_by_email(pool: &DbPool, email: &str) -> Result<Vec<Invitation>> {
        let invitations = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT * FROM invitations
            WHERE email = $1 AND is_accepted = false
            ORDER BY created_at DESC
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_all(pool)
        .await?;

        Ok(invitations)
    }

    /// Marked within the same transaction that creates the membership, so
    /// the invitation link cannot be replayed after first acceptance.
    pub async fn mark_accepted_with_executor<'e, E>(executor: E, invitation_id: Uuid) -> Result<()>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(r#"UPDATE invitations SET is_accepted = true WHERE id = $1"#)
            .bind(invitation_id)
            .execute(executor)
            .await?;

        Ok(())
    }
}
