use async_trait::async_trait;
use lingua_core::models::{NewProject, Project, ProjectChanges, ProjectStats};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::ProjectStore;

const PROJECT_COLUMNS: &str = "id, organization_id, name, description, source_language, \
     target_languages, created_by, created_at, updated_at";

#[async_trait]
impl ProjectStore for PgStoreTx {
    #[tracing::instrument(skip(self, project), fields(db.table = "projects", db.operation = "insert"))]
    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(&format!(
            r#"
            INSERT INTO projects (id, organization_id, name, description, source_language,
                                  target_languages, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(project.organization_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.source_language)
        .bind(&project.target_languages)
        .bind(project.created_by)
        .bind(project.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select", db.record_id = %id))]
    async fn get_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(&format!(
            "SELECT {} FROM projects WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    async fn find_project_by_name(
        &mut self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(&format!(
            "SELECT {} FROM projects WHERE organization_id = $1 AND name = $2",
            PROJECT_COLUMNS
        ))
        .bind(organization_id)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    async fn list_projects(&mut self, organization_id: Uuid) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<Postgres, Project>(&format!(
            "SELECT {} FROM projects WHERE organization_id = $1 ORDER BY created_at ASC, id ASC",
            PROJECT_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(projects)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "select"))]
    async fn list_projects_for_user(&mut self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let projects = sqlx::query_as::<Postgres, Project>(
            r#"
            SELECT p.id, p.organization_id, p.name, p.description, p.source_language,
                   p.target_languages, p.created_by, p.created_at, p.updated_at
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY p.created_at ASC, p.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(projects)
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = "projects", db.operation = "update", db.record_id = %id))]
    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<Postgres, Project>(&format!(
            r#"
            UPDATE projects
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                source_language = COALESCE($4, source_language),
                target_languages = COALESCE($5, target_languages),
                updated_at = $6
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.source_language)
        .bind(&changes.target_languages)
        .bind(changes.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(project)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "delete", db.record_id = %id))]
    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "projects", db.operation = "aggregate", db.record_id = %id))]
    async fn project_stats(&mut self, id: Uuid) -> Result<Option<ProjectStats>, AppError> {
        let stats = sqlx::query_as::<Postgres, ProjectStats>(
            r#"
            SELECT p.id AS project_id,
                   p.name,
                   (SELECT COUNT(*) FROM translation_files f WHERE f.project_id = p.id) AS files,
                   (SELECT COUNT(*)
                      FROM messages m
                      JOIN translation_files f ON f.id = m.file_id
                     WHERE f.project_id = p.id) AS total_messages,
                   (SELECT COUNT(*) FROM project_members pm WHERE pm.project_id = p.id) AS members
            FROM projects p
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(stats)
    }
}
