use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::models::{NewTranslationVersion, Snapshot, TranslationVersion};
use lingua_core::AppError;
use sqlx::types::Json;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::VersionStore;

const VERSION_COLUMNS: &str = "id, file_id, version_number, snapshot, created_by, created_at";

/// Row shape of `translation_versions`; the snapshot column is JSONB
#[derive(sqlx::FromRow)]
struct VersionRow {
    id: Uuid,
    file_id: Uuid,
    version_number: i32,
    snapshot: Json<Snapshot>,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<VersionRow> for TranslationVersion {
    fn from(row: VersionRow) -> Self {
        TranslationVersion {
            id: row.id,
            file_id: row.file_id,
            version_number: row.version_number,
            snapshot: row.snapshot.0,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl VersionStore for PgStoreTx {
    #[tracing::instrument(skip(self, version), fields(db.table = "translation_versions", db.operation = "insert", version_number = version.version_number))]
    async fn insert_version(
        &mut self,
        version: NewTranslationVersion,
    ) -> Result<TranslationVersion, AppError> {
        let row = sqlx::query_as::<Postgres, VersionRow>(&format!(
            r#"
            INSERT INTO translation_versions (id, file_id, version_number, snapshot, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            VERSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(version.file_id)
        .bind(version.version_number)
        .bind(Json(&version.snapshot))
        .bind(version.created_by)
        .bind(version.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_versions", db.operation = "select"))]
    async fn list_versions(
        &mut self,
        file_id: Uuid,
    ) -> Result<Vec<TranslationVersion>, AppError> {
        let rows = sqlx::query_as::<Postgres, VersionRow>(&format!(
            "SELECT {} FROM translation_versions WHERE file_id = $1 ORDER BY version_number ASC",
            VERSION_COLUMNS
        ))
        .bind(file_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows.into_iter().map(TranslationVersion::from).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_versions", db.operation = "select"))]
    async fn get_version(
        &mut self,
        file_id: Uuid,
        version_number: i32,
    ) -> Result<Option<TranslationVersion>, AppError> {
        let row = sqlx::query_as::<Postgres, VersionRow>(&format!(
            "SELECT {} FROM translation_versions WHERE file_id = $1 AND version_number = $2",
            VERSION_COLUMNS
        ))
        .bind(file_id)
        .bind(version_number)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(TranslationVersion::from))
    }
}
