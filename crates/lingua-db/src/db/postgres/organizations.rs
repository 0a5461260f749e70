use async_trait::async_trait;
use lingua_core::models::{NewOrganization, Organization, OrganizationChanges};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::OrganizationStore;

const ORGANIZATION_COLUMNS: &str = "id, name, description, created_by, created_at, updated_at";

#[async_trait]
impl OrganizationStore for PgStoreTx {
    #[tracing::instrument(skip(self, organization), fields(db.table = "organizations", db.operation = "insert"))]
    async fn insert_organization(
        &mut self,
        organization: NewOrganization,
    ) -> Result<Organization, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(&format!(
            r#"
            INSERT INTO organizations (id, name, description, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ORGANIZATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&organization.name)
        .bind(&organization.description)
        .bind(organization.created_by)
        .bind(organization.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(organization)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select", db.record_id = %id))]
    async fn get_organization(&mut self, id: Uuid) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(&format!(
            "SELECT {} FROM organizations WHERE id = $1",
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(organization)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    async fn find_organization_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(&format!(
            r#"
            SELECT {} FROM organizations
            WHERE LOWER(name) = LOWER($1)
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
            ORGANIZATION_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(organization)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "select"))]
    async fn list_organizations_by_creator(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<Organization>, AppError> {
        let organizations = sqlx::query_as::<Postgres, Organization>(&format!(
            "SELECT {} FROM organizations WHERE created_by = $1 ORDER BY created_at ASC, id ASC",
            ORGANIZATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(organizations)
    }

    #[tracing::instrument(skip(self, changes), fields(db.table = "organizations", db.operation = "update", db.record_id = %id))]
    async fn update_organization(
        &mut self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError> {
        let organization = sqlx::query_as::<Postgres, Organization>(&format!(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            ORGANIZATION_COLUMNS
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(organization)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organizations", db.operation = "delete", db.record_id = %id))]
    async fn delete_organization(&mut self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
