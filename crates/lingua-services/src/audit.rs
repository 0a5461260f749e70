//! Audit Recorder
//!
//! Appends one immutable entry per attributable change, inside the caller's
//! transaction. A failed append fails the whole operation.

use lingua_core::models::{AuditLog, AuditQuery, NewAuditEntry};
use lingua_core::{AccessLevel, AppError};
use lingua_db::{commit_or_rollback, AuditStore, ProjectStore, StoreTx};
use uuid::Uuid;

use crate::access::require;
use crate::context::ServiceContext;

/// Writes an entry through the open transaction.
pub async fn record(tx: &mut dyn StoreTx, entry: NewAuditEntry) -> Result<AuditLog, AppError> {
    let log = tx.insert_audit(entry).await?;
    tracing::debug!(
        audit_id = %log.id,
        project_id = %log.project_id,
        action = %log.action,
        entity_type = %log.entity_type,
        entity_id = %log.entity_id,
        "Audit entry recorded"
    );
    Ok(log)
}

/// Read path over a project's audit trail
#[derive(Clone)]
pub struct AuditRecorder {
    ctx: ServiceContext,
}

impl AuditRecorder {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Entries of the project, newest first. Any member may read them.
    #[tracing::instrument(skip(self, query), fields(actor = %actor, project_id = %project_id))]
    pub async fn list(
        &self,
        actor: Uuid,
        project_id: Uuid,
        query: AuditQuery,
    ) -> Result<Vec<AuditLog>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<AuditLog>, AppError> = async {
            if tx.get_project(project_id).await?.is_none() {
                return Err(AppError::not_found("Project", project_id));
            }
            require(&mut *tx, self.ctx.policy(), project_id, actor, AccessLevel::Read).await?;
            tx.list_audit(project_id, &query).await
        }
        .await;
        commit_or_rollback(tx, result).await
    }
}
