use lingua_core::models::{
    normalize_languages, AuditAction, CreateProjectRequest, EntityType, NewAuditEntry,
    NewProject, NewProjectMember, Project, ProjectChanges, ProjectStats, UpdateProjectRequest,
};
use lingua_core::{AccessLevel, AppError};
use lingua_db::{
    commit_or_rollback, FileStore, MemberStore, OrganizationStore, ProjectStore, StoreTx,
    UserStore,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::access::{require, require_org};
use crate::audit::record;
use crate::context::ServiceContext;

/// Translation projects: creation, settings, deletion and statistics.
#[derive(Clone)]
pub struct ProjectService {
    ctx: ServiceContext,
}

async fn load_project(tx: &mut dyn StoreTx, project_id: Uuid) -> Result<Project, AppError> {
    tx.get_project(project_id)
        .await?
        .ok_or_else(|| AppError::not_found("Project", project_id))
}

fn check_languages(source_language: &str, target_languages: &[String]) -> Result<(), AppError> {
    if target_languages.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one target language is required".to_string(),
        ));
    }
    if target_languages.iter().any(|l| l == source_language) {
        return Err(AppError::BusinessRuleViolation(format!(
            "Source language '{}' cannot also be a target language",
            source_language
        )));
    }
    Ok(())
}

impl ProjectService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Creates the project and makes the actor its member at the highest tier. The actor
    /// must belong to the organization.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn create(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        request: CreateProjectRequest,
    ) -> Result<Project, AppError> {
        request.validate()?;
        let source_language = request.source_language.trim().to_string();
        let target_languages = normalize_languages(&request.target_languages);
        check_languages(&source_language, &target_languages)?;
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Project, AppError> = async {
            if tx.get_user(actor).await?.is_none() {
                return Err(AppError::not_found("User", actor));
            }
            if tx.get_organization(organization_id).await?.is_none() {
                return Err(AppError::not_found("Organization", organization_id));
            }
            require_org(&mut *tx, organization_id, actor, false).await?;
            if tx
                .find_project_by_name(organization_id, &request.name)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "Project '{}' already exists in this organization",
                    request.name
                )));
            }

            let project = tx
                .insert_project(NewProject {
                    organization_id,
                    name: request.name.clone(),
                    description: request.description.clone(),
                    source_language: source_language.clone(),
                    target_languages: target_languages.clone(),
                    created_by: actor,
                    created_at: now,
                })
                .await?;

            tx.insert_member(NewProjectMember {
                project_id: project.id,
                user_id: actor,
                role: self.ctx.policy().hierarchy().top().clone(),
                created_at: now,
            })
            .await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    project.id,
                    actor,
                    AuditAction::Create,
                    EntityType::Project,
                    project.id,
                    now,
                )
                .with_details(json!({
                    "name": project.name,
                    "source_language": project.source_language,
                    "target_languages": project.target_languages,
                })),
            )
            .await?;

            Ok(project)
        }
        .await;

        let project = commit_or_rollback(tx, result).await?;
        tracing::info!(project_id = %project.id, name = %project.name, "Project created");
        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn get(&self, actor: Uuid, project_id: Uuid) -> Result<Project, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Project, AppError> = async {
            let project = load_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            Ok(project)
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Projects of an organization. Its creator sees all of them, anyone else only
    /// those they are a member of.
    #[tracing::instrument(skip(self), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn list_for_organization(
        &self,
        actor: Uuid,
        organization_id: Uuid,
    ) -> Result<Vec<Project>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<Project>, AppError> = async {
            let organization = tx
                .get_organization(organization_id)
                .await?
                .ok_or_else(|| AppError::not_found("Organization", organization_id))?;
            let projects = tx.list_projects(organization_id).await?;
            if organization.created_by == Some(actor) {
                return Ok(projects);
            }
            let mut visible = Vec::with_capacity(projects.len());
            for project in projects {
                if tx.find_member(project.id, actor).await?.is_some() {
                    visible.push(project);
                }
            }
            Ok(visible)
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Every project the actor is a member of
    #[tracing::instrument(skip(self), fields(actor = %actor))]
    pub async fn list_for_user(&self, actor: Uuid) -> Result<Vec<Project>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result = tx.list_projects_for_user(actor).await;
        commit_or_rollback(tx, result).await
    }

    #[tracing::instrument(skip(self, request), fields(actor = %actor, project_id = %project_id))]
    pub async fn update(
        &self,
        actor: Uuid,
        project_id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<Project, AppError> {
        request.validate()?;
        if request.name.is_none()
            && request.description.is_none()
            && request.source_language.is_none()
            && request.target_languages.is_none()
        {
            return Err(AppError::InvalidInput(
                "An update must change at least one field".to_string(),
            ));
        }
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Project, AppError> = async {
            let current = load_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;

            let source_language = request
                .source_language
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.source_language)
                .to_string();
            let target_languages = match request.target_languages {
                Some(ref requested) => normalize_languages(requested),
                None => current.target_languages.clone(),
            };
            check_languages(&source_language, &target_languages)?;

            for dropped in current
                .target_languages
                .iter()
                .filter(|l| !target_languages.contains(*l))
            {
                if tx.find_file_by_language(project_id, dropped).await?.is_some() {
                    return Err(AppError::BusinessRuleViolation(format!(
                        "Target language '{}' still has a translation file",
                        dropped
                    )));
                }
            }

            if let Some(ref name) = request.name {
                if let Some(existing) = tx
                    .find_project_by_name(current.organization_id, name)
                    .await?
                {
                    if existing.id != project_id {
                        return Err(AppError::Conflict(format!(
                            "Project '{}' already exists in this organization",
                            name
                        )));
                    }
                }
            }

            let project = tx
                .update_project(
                    project_id,
                    ProjectChanges {
                        name: request.name.clone(),
                        description: request.description.clone(),
                        source_language: Some(source_language),
                        target_languages: Some(target_languages),
                        updated_at: now,
                    },
                )
                .await?
                .ok_or_else(|| AppError::not_found("Project", project_id))?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    project_id,
                    actor,
                    AuditAction::Update,
                    EntityType::Project,
                    project_id,
                    now,
                )
                .with_details(json!({
                    "before": {
                        "name": current.name,
                        "source_language": current.source_language,
                        "target_languages": current.target_languages,
                    },
                    "after": {
                        "name": project.name,
                        "source_language": project.source_language,
                        "target_languages": project.target_languages,
                    },
                })),
            )
            .await?;

            Ok(project)
        }
        .await;

        let project = commit_or_rollback(tx, result).await?;
        tracing::info!(project_id = %project_id, "Project updated");
        Ok(project)
    }

    /// Deletes the project with its members, files, messages, versions and audit trail.
    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn delete(&self, actor: Uuid, project_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Project, AppError> = async {
            let project = load_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;
            tx.delete_project(project_id).await?;
            Ok(project)
        }
        .await;

        let project = commit_or_rollback(tx, result).await?;
        // The project's audit trail goes with it, so the deletion is only traced
        tracing::info!(
            project_id = %project_id,
            organization_id = %project.organization_id,
            name = %project.name,
            actor = %actor,
            "Project deleted"
        );
        Ok(())
    }

    /// File, message and member counts of the project.
    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn stats(&self, actor: Uuid, project_id: Uuid) -> Result<ProjectStats, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<ProjectStats, AppError> = async {
            load_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.project_stats(project_id)
                .await?
                .ok_or_else(|| AppError::not_found("Project", project_id))
        }
        .await;
        commit_or_rollback(tx, result).await
    }
}
