use async_trait::async_trait;
use lingua_core::models::{NewUser, ProjectMember, User};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::members::MEMBER_COLUMNS;
use super::PgStoreTx;
use crate::db::store::UserStore;

const USER_COLUMNS: &str = "id, email, name, created_at";

#[async_trait]
impl UserStore for PgStoreTx {
    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert"))]
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "INSERT INTO users (id, email, name, created_at) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<Postgres, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(user)
    }

    // References are nulled and memberships removed by the foreign key actions
    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "delete", db.record_id = %id))]
    async fn delete_user(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "project_members", db.operation = "select"))]
    async fn memberships_of_user(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<ProjectMember>, AppError> {
        let members = sqlx::query_as::<Postgres, ProjectMember>(&format!(
            "SELECT {} FROM project_members WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
            MEMBER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }
}
