use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::message::{Message, MessageDraft};

/// Inserts a thread message on any executor, so callers can pair it with an
/// appointment write inside their own transaction.
pub async fn insert_message<'e, E>(
    executor: E,
    appointment_id: Uuid,
    draft: &MessageDraft,
) -> Result<Message>
where
    E: PgExecutor<'e>,
{
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (appointment_id, sender_type, sender_name, body)
        VALUES ($1, $2, $3, $4)
        RETURNING id, appointment_id, sender_type, sender_name, body, created_at
        "#,
    )
    .bind(appointment_id)
    .bind(draft.sender_type.as_str())
    .bind(&draft.sender_name)
    .bind(&draft.body)
    .fetch_one(executor)
    .await?;

    Ok(message)
}

#[derive(Clone)]
pub struct MessageService {
    pool: PgPool,
}

impl MessageService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, appointment_id: Uuid, draft: &MessageDraft) -> Result<Message> {
        insert_message(&self.pool, appointment_id, draft).await
    }

    pub async fn get_by_appointment(&self, appointment_id: Uuid) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, appointment_id, sender_type, sender_name, body, created_at
            FROM messages
            WHERE appointment_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }
}
