use lingua_core::models::{
    AuditAction, CreateMessageRequest, EntityType, Message, MessageStatus, NewAuditEntry,
    NewMessage, RejectMessageRequest, TranslationFile, UpdateMessageRequest,
};
use lingua_core::{AccessLevel, AppError};
use lingua_db::{commit_or_rollback, FileStore, MessageStore, StoreTx};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::access::require;
use crate::audit::record;
use crate::context::ServiceContext;
use crate::snapshot::snapshot_file;

/// Message lifecycle: create, the atomic update workflow, review and deletion.
#[derive(Clone)]
pub struct MessageService {
    ctx: ServiceContext,
}

/// Reads the message, locked when `lock` is set, together with the file that owns it.
async fn load_message(
    tx: &mut dyn StoreTx,
    message_id: Uuid,
    lock: bool,
) -> Result<(Message, TranslationFile), AppError> {
    let message = if lock {
        tx.lock_message(message_id).await?
    } else {
        tx.get_message(message_id).await?
    };
    let message = message.ok_or_else(|| AppError::not_found("Message", message_id))?;

    let file = tx
        .get_file(message.file_id)
        .await?
        .ok_or_else(|| AppError::not_found("Translation file", message.file_id))?;

    Ok((message, file))
}

impl MessageService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Adds a PENDING message to a file. Not versioned.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, file_id = %file_id))]
    pub async fn create(
        &self,
        actor: Uuid,
        file_id: Uuid,
        request: CreateMessageRequest,
    ) -> Result<Message, AppError> {
        request.validate()?;
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Message, AppError> = async {
            let file = tx
                .get_file(file_id)
                .await?
                .ok_or_else(|| AppError::not_found("Translation file", file_id))?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Translate,
            )
            .await?;

            if tx.find_message_by_key(file_id, &request.key).await?.is_some() {
                return Err(AppError::Conflict(format!(
                    "Message key '{}' already exists in this file",
                    request.key
                )));
            }

            let message = tx
                .insert_message(NewMessage {
                    file_id,
                    key: request.key.clone(),
                    value: request.value.clone(),
                    comment: request.comment.clone(),
                    created_by: actor,
                    created_at: now,
                })
                .await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Create,
                    EntityType::Message,
                    message.id,
                    now,
                )
                .with_details(json!({
                    "key": message.key,
                    "language_code": file.language_code,
                    "value": message.value,
                })),
            )
            .await?;

            Ok(message)
        }
        .await;

        let message = commit_or_rollback(tx, result).await?;
        tracing::info!(message_id = %message.id, key = %message.key, "Message created");
        Ok(message)
    }

    /// The atomic update workflow. In one transaction: apply the change, audit it,
    /// advance the file's version, snapshot every message of the file under the new
    /// number and audit the version. Any failure discards all of it.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, message_id = %message_id))]
    pub async fn update(
        &self,
        actor: Uuid,
        message_id: Uuid,
        request: UpdateMessageRequest,
    ) -> Result<Message, AppError> {
        request.validate()?;
        if request.is_empty() {
            return Err(AppError::InvalidInput(
                "An update must change the value or the comment".to_string(),
            ));
        }
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(Message, i32), AppError> = async {
            let (mut message, file) = load_message(&mut *tx, message_id, true).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Translate,
            )
            .await?;

            let before = json!({ "value": message.value, "comment": message.comment });
            if let Some(value) = request.value {
                message.value = Some(value);
            }
            if let Some(comment) = request.comment {
                message.comment = Some(comment);
            }
            if self.ctx.update_resets_status() && message.status != MessageStatus::Pending {
                message.status = MessageStatus::Pending;
                message.reviewed_by = None;
            }
            message.updated_at = Some(now);
            let message = tx.save_message(&message).await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Update,
                    EntityType::Message,
                    message.id,
                    now,
                )
                .with_details(json!({
                    "key": message.key,
                    "before": before,
                    "after": { "value": message.value, "comment": message.comment },
                })),
            )
            .await?;

            let version = snapshot_file(&mut *tx, file.id, actor, now).await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Update,
                    EntityType::TranslationVersion,
                    version.id,
                    now,
                )
                .with_details(json!({
                    "file_id": file.id,
                    "version_number": version.version_number,
                    "message_id": message.id,
                })),
            )
            .await?;

            Ok((message, version.version_number))
        }
        .await;

        let (message, version_number) = commit_or_rollback(tx, result).await?;
        tracing::info!(
            message_id = %message.id,
            file_id = %message.file_id,
            version_number,
            "Message updated"
        );
        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, message_id = %message_id))]
    pub async fn approve(&self, actor: Uuid, message_id: Uuid) -> Result<Message, AppError> {
        self.review(actor, message_id, MessageStatus::Approved, None)
            .await
    }

    #[tracing::instrument(skip(self, request), fields(actor = %actor, message_id = %message_id))]
    pub async fn reject(
        &self,
        actor: Uuid,
        message_id: Uuid,
        request: RejectMessageRequest,
    ) -> Result<Message, AppError> {
        request.validate()?;
        self.review(actor, message_id, MessageStatus::Rejected, request.reason)
            .await
    }

    /// Moves a PENDING message to `target`, recording the actor as reviewer.
    async fn review(
        &self,
        actor: Uuid,
        message_id: Uuid,
        target: MessageStatus,
        reason: Option<String>,
    ) -> Result<Message, AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Message, AppError> = async {
            let (mut message, file) = load_message(&mut *tx, message_id, true).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Review,
            )
            .await?;

            if message.status != MessageStatus::Pending {
                return Err(AppError::InvalidStatusTransition {
                    from: message.status,
                    to: target,
                });
            }

            message.status = target;
            message.reviewed_by = Some(actor);
            message.updated_at = Some(now);
            let message = tx.save_message(&message).await?;

            let (action, details) = match target {
                MessageStatus::Rejected => (
                    AuditAction::Reject,
                    json!({ "key": message.key, "status": target, "reason": reason }),
                ),
                _ => (
                    AuditAction::Approve,
                    json!({ "key": message.key, "status": target }),
                ),
            };
            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    action,
                    EntityType::Message,
                    message.id,
                    now,
                )
                .with_details(details),
            )
            .await?;

            Ok(message)
        }
        .await;

        let message = commit_or_rollback(tx, result).await?;
        tracing::info!(message_id = %message.id, status = %message.status, "Message reviewed");
        Ok(message)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, message_id = %message_id))]
    pub async fn delete(&self, actor: Uuid, message_id: Uuid) -> Result<(), AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            let (message, file) = load_message(&mut *tx, message_id, true).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;

            tx.delete_message(message.id).await?;
            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Delete,
                    EntityType::Message,
                    message.id,
                    now,
                )
                .with_details(json!({ "key": message.key, "file_id": file.id })),
            )
            .await?;

            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(message_id = %message_id, "Message deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, message_id = %message_id))]
    pub async fn get(&self, actor: Uuid, message_id: Uuid) -> Result<Message, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Message, AppError> = async {
            let (message, file) = load_message(&mut *tx, message_id, false).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            Ok(message)
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Messages of a file in creation order, optionally only those with `status`.
    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn list(
        &self,
        actor: Uuid,
        file_id: Uuid,
        status: Option<MessageStatus>,
    ) -> Result<Vec<Message>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<Message>, AppError> = async {
            let file = tx
                .get_file(file_id)
                .await?
                .ok_or_else(|| AppError::not_found("Translation file", file_id))?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.list_messages(file_id, status).await
        }
        .await;
        commit_or_rollback(tx, result).await
    }
}
