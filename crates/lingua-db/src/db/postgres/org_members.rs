use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::models::{
    NewOrganizationMember, OrgRole, OrganizationMember, OrganizationMemberQuery,
};
use lingua_core::AppError;
use sqlx::Postgres;
use uuid::Uuid;

use super::PgStoreTx;
use crate::db::store::OrganizationMemberStore;

const ORG_MEMBER_COLUMNS: &str = "id, organization_id, user_id, role, created_at, updated_at";

#[async_trait]
impl OrganizationMemberStore for PgStoreTx {
    #[tracing::instrument(skip(self, member), fields(db.table = "organization_members", db.operation = "insert"))]
    async fn insert_org_member(
        &mut self,
        member: NewOrganizationMember,
    ) -> Result<OrganizationMember, AppError> {
        let member = sqlx::query_as::<Postgres, OrganizationMember>(&format!(
            r#"
            INSERT INTO organization_members (id, organization_id, user_id, role, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ORG_MEMBER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(member.organization_id)
        .bind(member.user_id)
        .bind(member.role)
        .bind(member.created_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_members", db.operation = "select"))]
    async fn find_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMember>, AppError> {
        let member = sqlx::query_as::<Postgres, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE organization_id = $1 AND user_id = $2",
            ORG_MEMBER_COLUMNS
        ))
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self, query), fields(db.table = "organization_members", db.operation = "select"))]
    async fn list_org_members(
        &mut self,
        query: &OrganizationMemberQuery,
    ) -> Result<Vec<OrganizationMember>, AppError> {
        let members = sqlx::query_as::<Postgres, OrganizationMember>(&format!(
            r#"
            SELECT {} FROM organization_members
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::org_role IS NULL OR role = $3)
            ORDER BY created_at ASC, id ASC
            "#,
            ORG_MEMBER_COLUMNS
        ))
        .bind(query.organization_id)
        .bind(query.user_id)
        .bind(query.role)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_members", db.operation = "select_for_update"))]
    async fn lock_org_members(
        &mut self,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationMember>, AppError> {
        let members = sqlx::query_as::<Postgres, OrganizationMember>(&format!(
            "SELECT {} FROM organization_members WHERE organization_id = $1 ORDER BY id FOR UPDATE",
            ORG_MEMBER_COLUMNS
        ))
        .bind(organization_id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(members)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_members", db.operation = "update"))]
    async fn update_org_member_role(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<OrganizationMember>, AppError> {
        let member = sqlx::query_as::<Postgres, OrganizationMember>(&format!(
            r#"
            UPDATE organization_members
            SET role = $3, updated_at = $4
            WHERE organization_id = $1 AND user_id = $2
            RETURNING {}
            "#,
            ORG_MEMBER_COLUMNS
        ))
        .bind(organization_id)
        .bind(user_id)
        .bind(role)
        .bind(updated_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_members", db.operation = "delete"))]
    async fn delete_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM organization_members WHERE organization_id = $1 AND user_id = $2",
        )
        .bind(organization_id)
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "organization_members", db.operation = "delete"))]
    async fn delete_org_members_by_user(&mut self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM organization_members WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }
}
