use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::models::{NewTranslationFile, TranslationFile};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::FileStore;

const FILE_COLUMNS: &str = "id, project_id, language_code, language_name, current_version, \
     created_by, created_at, updated_at";

#[async_trait]
impl FileStore for PgStoreTx {
    #[tracing::instrument(skip(self, file), fields(db.table = "translation_files", db.operation = "insert"))]
    async fn insert_file(
        &mut self,
        file: NewTranslationFile,
    ) -> Result<TranslationFile, AppError> {
        let file = sqlx::query_as::<Postgres, TranslationFile>(&format!(
            r#"
            INSERT INTO translation_files (id, project_id, language_code, language_name,
                                           current_version, created_by, created_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(file.project_id)
        .bind(&file.language_code)
        .bind(&file.language_name)
        .bind(file.created_by)
        .bind(file.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "select", db.record_id = %id))]
    async fn get_file(&mut self, id: Uuid) -> Result<Option<TranslationFile>, AppError> {
        let file = sqlx::query_as::<Postgres, TranslationFile>(&format!(
            "SELECT {} FROM translation_files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "select"))]
    async fn find_file_by_language(
        &mut self,
        project_id: Uuid,
        language_code: &str,
    ) -> Result<Option<TranslationFile>, AppError> {
        let file = sqlx::query_as::<Postgres, TranslationFile>(&format!(
            "SELECT {} FROM translation_files WHERE project_id = $1 AND language_code = $2",
            FILE_COLUMNS
        ))
        .bind(project_id)
        .bind(language_code)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "select"))]
    async fn list_files(&mut self, project_id: Uuid) -> Result<Vec<TranslationFile>, AppError> {
        let files = sqlx::query_as::<Postgres, TranslationFile>(&format!(
            "SELECT {} FROM translation_files WHERE project_id = $1 ORDER BY created_at ASC, id ASC",
            FILE_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(files)
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "update", db.record_id = %id))]
    async fn update_file(
        &mut self,
        id: Uuid,
        language_name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TranslationFile>, AppError> {
        let file = sqlx::query_as::<Postgres, TranslationFile>(&format!(
            "UPDATE translation_files SET language_name = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            FILE_COLUMNS
        ))
        .bind(id)
        .bind(language_name)
        .bind(updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(file)
    }

    // The UPDATE takes the row lock, so a concurrent bump waits and then reads the
    // committed counter.
    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "update", db.record_id = %id))]
    async fn bump_file_version(
        &mut self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<i32, AppError> {
        let version = sqlx::query_scalar::<Postgres, i32>(
            r#"
            UPDATE translation_files
            SET current_version = current_version + 1, updated_at = $2
            WHERE id = $1
            RETURNING current_version
            "#,
        )
        .bind(id)
        .bind(updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        version.ok_or_else(|| AppError::not_found("Translation file", id))
    }

    #[tracing::instrument(skip(self), fields(db.table = "translation_files", db.operation = "delete", db.record_id = %id))]
    async fn delete_file(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM translation_files WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
