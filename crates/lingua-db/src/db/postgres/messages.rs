use async_trait::async_trait;
use lingua_core::models::{Message, MessageStatus, NewMessage};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::MessageStore;

const MESSAGE_COLUMNS: &str = "id, file_id, key, value, comment, status, created_by, \
     reviewed_by, created_at, updated_at";

#[async_trait]
impl MessageStore for PgStoreTx {
    #[tracing::instrument(skip(self, message), fields(db.table = "messages", db.operation = "insert"))]
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError> {
        let message = sqlx::query_as::<Postgres, Message>(&format!(
            r#"
            INSERT INTO messages (id, file_id, key, value, comment, status, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(message.file_id)
        .bind(&message.key)
        .bind(&message.value)
        .bind(&message.comment)
        .bind(MessageStatus::Pending)
        .bind(message.created_by)
        .bind(message.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select", db.record_id = %id))]
    async fn get_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<Postgres, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select_for_update", db.record_id = %id))]
    async fn lock_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<Postgres, Message>(&format!(
            "SELECT {} FROM messages WHERE id = $1 FOR UPDATE",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select"))]
    async fn find_message_by_key(
        &mut self,
        file_id: Uuid,
        key: &str,
    ) -> Result<Option<Message>, AppError> {
        let message = sqlx::query_as::<Postgres, Message>(&format!(
            "SELECT {} FROM messages WHERE file_id = $1 AND key = $2",
            MESSAGE_COLUMNS
        ))
        .bind(file_id)
        .bind(key)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "select"))]
    async fn list_messages(
        &mut self,
        file_id: Uuid,
        status: Option<MessageStatus>,
    ) -> Result<Vec<Message>, AppError> {
        let messages = match status {
            None => {
                sqlx::query_as::<Postgres, Message>(&format!(
                    "SELECT {} FROM messages WHERE file_id = $1 ORDER BY created_at ASC, id ASC",
                    MESSAGE_COLUMNS
                ))
                .bind(file_id)
                .fetch_all(&mut *self.tx)
                .await?
            }
            Some(status) => {
                sqlx::query_as::<Postgres, Message>(&format!(
                    "SELECT {} FROM messages WHERE file_id = $1 AND status = $2 \
                     ORDER BY created_at ASC, id ASC",
                    MESSAGE_COLUMNS
                ))
                .bind(file_id)
                .bind(status)
                .fetch_all(&mut *self.tx)
                .await?
            }
        };

        Ok(messages)
    }

    #[tracing::instrument(skip(self, message), fields(db.table = "messages", db.operation = "update", db.record_id = %message.id))]
    async fn save_message(&mut self, message: &Message) -> Result<Message, AppError> {
        let saved = sqlx::query_as::<Postgres, Message>(&format!(
            r#"
            UPDATE messages
            SET value = $2, comment = $3, status = $4, reviewed_by = $5, updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message.id)
        .bind(&message.value)
        .bind(&message.comment)
        .bind(message.status)
        .bind(message.reviewed_by)
        .bind(message.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        saved.ok_or_else(|| AppError::not_found("Message", message.id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "messages", db.operation = "delete", db.record_id = %id))]
    async fn delete_message(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
