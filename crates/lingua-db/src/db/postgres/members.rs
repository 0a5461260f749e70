use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::models::{NewProjectMember, ProjectMember};
use lingua_core::{AppError, Role};
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::MemberStore;

pub(super) const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, created_at, updated_at";

#[async_trait]
impl MemberStore for PgStoreTx {
    #[tracing::instrument(skip(self, member), fields(db.table = "project_members", db.operation = "insert"))]
    async fn insert_member(
        &mut self,
        member: NewProjectMember,
    ) -> Result<ProjectMember, AppError> {
        let member = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            r#"
            INSERT INTO project_members (id, project_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(member.project_id)
        .bind(member.user_id)
        .bind(&member.role)
        .bind(member.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "select"))]
    async fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, AppError> {
        let member = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE project_id = $1 AND user_id = $2",
            MEMBER_COLUMNS
        ))
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "select"))]
    async fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        let members = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE project_id = $1 ORDER BY created_at ASC, id ASC",
            MEMBER_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "select_for_update"))]
    async fn lock_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        let members = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE project_id = $1 ORDER BY id FOR UPDATE",
            MEMBER_COLUMNS
        ))
        .bind(project_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "update"))]
    async fn update_member_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
        role: &Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ProjectMember>, AppError> {
        let member = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            r#"
            UPDATE project_members
            SET role = $3, updated_at = $4
            WHERE project_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            MEMBER_COLUMNS
        ))
        .bind(project_id)
        .bind(user_id)
        .bind(role)
        .bind(updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "delete"))]
    async fn delete_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .execute(&mut *self.tx)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
