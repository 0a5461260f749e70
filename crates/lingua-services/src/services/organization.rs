use lingua_core::models::{
    CreateOrganizationRequest, NewOrganization, NewOrganizationMember, OrgRole, Organization,
    OrganizationChanges, UpdateOrganizationRequest,
};
use lingua_core::AppError;
use lingua_db::{commit_or_rollback, OrganizationMemberStore, OrganizationStore, StoreTx, UserStore};
use uuid::Uuid;
use validator::Validate;

use crate::access::require_org;
use crate::context::ServiceContext;

/// Organizations own projects. Their ADMIN members may change or delete them.
#[derive(Clone)]
pub struct OrganizationService {
    ctx: ServiceContext,
}

async fn load_administered(
    tx: &mut dyn StoreTx,
    actor: Uuid,
    organization_id: Uuid,
) -> Result<Organization, AppError> {
    let organization = tx
        .get_organization(organization_id)
        .await?
        .ok_or_else(|| AppError::not_found("Organization", organization_id))?;
    require_org(tx, organization_id, actor, true).await?;
    Ok(organization)
}

impl OrganizationService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Creates the organization with the actor as its first ADMIN.
    #[tracing::instrument(skip(self, request), fields(actor = %actor))]
    pub async fn create(
        &self,
        actor: Uuid,
        request: CreateOrganizationRequest,
    ) -> Result<Organization, AppError> {
        request.validate()?;
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Organization, AppError> = async {
            if tx.get_user(actor).await?.is_none() {
                return Err(AppError::not_found("User", actor));
            }
            let organization = tx
                .insert_organization(NewOrganization {
                    name: request.name.trim().to_string(),
                    description: request.description.clone(),
                    created_by: actor,
                    created_at: now,
                })
                .await?;
            tx.insert_org_member(NewOrganizationMember {
                organization_id: organization.id,
                user_id: actor,
                role: OrgRole::Admin,
                created_at: now,
            })
            .await?;
            Ok(organization)
        }
        .await;

        let organization = commit_or_rollback(tx, result).await?;
        tracing::info!(organization_id = %organization.id, "Organization created");
        Ok(organization)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, organization_id: Uuid) -> Result<Organization, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result = tx.get_organization(organization_id).await.and_then(|found| {
            found.ok_or_else(|| AppError::not_found("Organization", organization_id))
        });
        commit_or_rollback(tx, result).await
    }

    /// Oldest organization with this name, compared case-insensitively
    #[tracing::instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<Organization, AppError> {
        let name = name.trim();
        let mut tx = self.ctx.store().begin().await?;
        let result = tx.find_organization_by_name(name).await.and_then(|found| {
            found.ok_or_else(|| AppError::NotFound(format!("Organization '{}' not found", name)))
        });
        commit_or_rollback(tx, result).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_for_creator(&self, actor: Uuid) -> Result<Vec<Organization>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result = tx.list_organizations_by_creator(actor).await;
        commit_or_rollback(tx, result).await
    }

    #[tracing::instrument(skip(self, request), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn update(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        request: UpdateOrganizationRequest,
    ) -> Result<Organization, AppError> {
        request.validate()?;
        if request.name.is_none() && request.description.is_none() {
            return Err(AppError::InvalidInput(
                "An update must change the name or the description".to_string(),
            ));
        }
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Organization, AppError> = async {
            load_administered(&mut *tx, actor, organization_id).await?;
            tx.update_organization(
                organization_id,
                OrganizationChanges {
                    name: request.name.as_deref().map(|n| n.trim().to_string()),
                    description: request.description.clone(),
                    updated_at: now,
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("Organization", organization_id))
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Deletes the organization with its memberships and every project in it.
    #[tracing::instrument(skip(self), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn delete(&self, actor: Uuid, organization_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            load_administered(&mut *tx, actor, organization_id).await?;
            tx.delete_organization(organization_id).await?;
            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(organization_id = %organization_id, "Organization deleted");
        Ok(())
    }
}
