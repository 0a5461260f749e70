use async_trait::async_trait;
use lingua_core::models::{AuditLog, AuditQuery, NewAuditEntry};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::AuditStore;

const AUDIT_COLUMNS: &str =
    "id, project_id, user_id, action, entity_type, entity_id, details, created_at";

// Upper bound on a single page of the audit trail
const MAX_AUDIT_PAGE: i64 = 1000;

#[async_trait]
impl AuditStore for PgStoreTx {
    #[tracing::instrument(skip(self, entry), fields(db.table = "audit_logs", db.operation = "insert", action = %entry.action, entity_type = %entry.entity_type))]
    async fn insert_audit(&mut self, entry: NewAuditEntry) -> Result<AuditLog, AppError> {
        let log = sqlx::query_as::<Postgres, AuditLog>(&format!(
            r#"
            INSERT INTO audit_logs (id, project_id, user_id, action, entity_type, entity_id, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            AUDIT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(entry.project_id)
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .bind(entry.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(log)
    }

    #[tracing::instrument(skip(self, query), fields(db.table = "audit_logs", db.operation = "select"))]
    async fn list_audit(
        &mut self,
        project_id: Uuid,
        query: &AuditQuery,
    ) -> Result<Vec<AuditLog>, AppError> {
        let limit = query.limit.unwrap_or(MAX_AUDIT_PAGE).clamp(1, MAX_AUDIT_PAGE);
        let logs = sqlx::query_as::<Postgres, AuditLog>(&format!(
            r#"
            SELECT {}
            FROM audit_logs
            WHERE project_id = $1 AND ($2::uuid IS NULL OR entity_id = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
            AUDIT_COLUMNS
        ))
        .bind(project_id)
        .bind(query.entity_id)
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(logs)
    }
}
