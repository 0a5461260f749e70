use lingua_core::models::{
    AuditAction, CreateFileRequest, EntityType, FileExport, NewAuditEntry, NewTranslationFile,
    TranslationFile, TranslationVersion, UpdateFileRequest, VersionRecord,
};
use lingua_core::{AccessLevel, AppError};
use lingua_db::{commit_or_rollback, FileStore, MessageStore, ProjectStore, StoreTx, VersionStore};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::access::require;
use crate::audit::record;
use crate::context::ServiceContext;

/// Per-language translation files of a project, their export and version history.
#[derive(Clone)]
pub struct FileService {
    ctx: ServiceContext,
}

async fn load_file(tx: &mut dyn StoreTx, file_id: Uuid) -> Result<TranslationFile, AppError> {
    tx.get_file(file_id)
        .await?
        .ok_or_else(|| AppError::not_found("Translation file", file_id))
}

impl FileService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Creates an empty file at version 0 for one of the project's target languages.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, project_id = %project_id))]
    pub async fn create(
        &self,
        actor: Uuid,
        project_id: Uuid,
        request: CreateFileRequest,
    ) -> Result<TranslationFile, AppError> {
        request.validate()?;
        let language_code = request.language_code.trim().to_string();
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<TranslationFile, AppError> = async {
            let project = tx
                .get_project(project_id)
                .await?
                .ok_or_else(|| AppError::not_found("Project", project_id))?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Translate,
            )
            .await?;

            if !project.allows_language(&language_code) {
                return Err(AppError::BusinessRuleViolation(format!(
                    "Language '{}' is not a target language of project {}",
                    language_code, project.name
                )));
            }
            if tx
                .find_file_by_language(project_id, &language_code)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "A file for language '{}' already exists in this project",
                    language_code
                )));
            }

            let file = tx
                .insert_file(NewTranslationFile {
                    project_id,
                    language_code: language_code.clone(),
                    language_name: request.language_name.clone(),
                    created_by: actor,
                    created_at: now,
                })
                .await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    project_id,
                    actor,
                    AuditAction::Create,
                    EntityType::TranslationFile,
                    file.id,
                    now,
                )
                .with_details(json!({
                    "language_code": file.language_code,
                    "language_name": file.language_name,
                })),
            )
            .await?;

            Ok(file)
        }
        .await;

        let file = commit_or_rollback(tx, result).await?;
        tracing::info!(file_id = %file.id, language_code = %file.language_code, "Translation file created");
        Ok(file)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn get(&self, actor: Uuid, file_id: Uuid) -> Result<TranslationFile, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<TranslationFile, AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            Ok(file)
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn list(
        &self,
        actor: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<TranslationFile>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<TranslationFile>, AppError> = async {
            if tx.get_project(project_id).await?.is_none() {
                return Err(AppError::not_found("Project", project_id));
            }
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.list_files(project_id).await
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Changes the language name. The version counter is left alone.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, file_id = %file_id))]
    pub async fn update(
        &self,
        actor: Uuid,
        file_id: Uuid,
        request: UpdateFileRequest,
    ) -> Result<TranslationFile, AppError> {
        request.validate()?;
        let Some(language_name) = request.language_name else {
            return Err(AppError::InvalidInput(
                "An update must change the language name".to_string(),
            ));
        };
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<TranslationFile, AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Translate,
            )
            .await?;

            let updated = tx
                .update_file(file_id, &language_name, now)
                .await?
                .ok_or_else(|| AppError::not_found("Translation file", file_id))?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Update,
                    EntityType::TranslationFile,
                    file_id,
                    now,
                )
                .with_details(json!({
                    "before": { "language_name": file.language_name },
                    "after": { "language_name": updated.language_name },
                })),
            )
            .await?;

            Ok(updated)
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Deletes the file with its messages and versions.
    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn delete(&self, actor: Uuid, file_id: Uuid) -> Result<(), AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;

            tx.delete_file(file_id).await?;
            record(
                &mut *tx,
                NewAuditEntry::new(
                    file.project_id,
                    actor,
                    AuditAction::Delete,
                    EntityType::TranslationFile,
                    file_id,
                    now,
                )
                .with_details(json!({
                    "language_code": file.language_code,
                    "version": file.current_version,
                })),
            )
            .await?;
            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(file_id = %file_id, "Translation file deleted");
        Ok(())
    }

    /// Current language metadata and every message of the file.
    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn export(&self, actor: Uuid, file_id: Uuid) -> Result<FileExport, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<FileExport, AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            let messages = tx.list_messages(file_id, None).await?;
            Ok(FileExport::new(file, messages))
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Past snapshots of the file, oldest first.
    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn version_history(
        &self,
        actor: Uuid,
        file_id: Uuid,
    ) -> Result<Vec<VersionRecord>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<VersionRecord>, AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            let versions = tx.list_versions(file_id).await?;
            Ok(versions.into_iter().map(VersionRecord::from).collect())
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, file_id = %file_id))]
    pub async fn get_version(
        &self,
        actor: Uuid,
        file_id: Uuid,
        version_number: i32,
    ) -> Result<TranslationVersion, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<TranslationVersion, AppError> = async {
            let file = load_file(&mut *tx, file_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                file.project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.get_version(file_id, version_number)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "Version {} of translation file {} not found",
                        version_number, file_id
                    ))
                })
        }
        .await;
        commit_or_rollback(tx, result).await
    }
}
