use lingua_core::models::{
    AddOrganizationMemberRequest, NewOrganizationMember, OrgRole, OrganizationMember,
    OrganizationMemberQuery, UpdateOrganizationMemberRequest,
};
use lingua_core::AppError;
use lingua_db::{commit_or_rollback, OrganizationMemberStore, OrganizationStore, StoreTx, UserStore};
use uuid::Uuid;

use crate::access::require_org;
use crate::context::ServiceContext;

/// Organization memberships. Every organization keeps at least one ADMIN.
#[derive(Clone)]
pub struct OrganizationMemberService {
    ctx: ServiceContext,
}

async fn ensure_organization(tx: &mut dyn StoreTx, organization_id: Uuid) -> Result<(), AppError> {
    match tx.get_organization(organization_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Organization", organization_id)),
    }
}

fn not_a_member(organization_id: Uuid, user_id: Uuid) -> AppError {
    AppError::NotFound(format!(
        "User {} is not a member of organization {}",
        user_id, organization_id
    ))
}

/// Fails when `target` is the organization's only ADMIN. Expects the organization's
/// member rows to be locked by the caller.
pub(crate) fn guard_last_org_admin(
    members: &[OrganizationMember],
    target: &OrganizationMember,
) -> Result<(), AppError> {
    if target.role != OrgRole::Admin {
        return Ok(());
    }
    let admins = members.iter().filter(|m| m.role == OrgRole::Admin).count();
    if admins <= 1 {
        return Err(AppError::BusinessRuleViolation(format!(
            "Organization {} must keep at least one ADMIN",
            target.organization_id
        )));
    }
    Ok(())
}

impl OrganizationMemberService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self, request), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn add(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        request: AddOrganizationMemberRequest,
    ) -> Result<OrganizationMember, AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<OrganizationMember, AppError> = async {
            ensure_organization(&mut *tx, organization_id).await?;
            require_org(&mut *tx, organization_id, actor, true).await?;

            if tx.get_user(request.user_id).await?.is_none() {
                return Err(AppError::not_found("User", request.user_id));
            }
            if tx
                .find_org_member(organization_id, request.user_id)
                .await?
                .is_some()
            {
                return Err(AppError::Conflict(format!(
                    "User {} is already a member of this organization",
                    request.user_id
                )));
            }

            tx.insert_org_member(NewOrganizationMember {
                organization_id,
                user_id: request.user_id,
                role: request.role,
                created_at: now,
            })
            .await
        }
        .await;

        let member = commit_or_rollback(tx, result).await?;
        tracing::info!(
            user_id = %member.user_id,
            role = %member.role,
            "Organization member added"
        );
        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, organization_id = %organization_id))]
    pub async fn get(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<OrganizationMember, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<OrganizationMember, AppError> = async {
            ensure_organization(&mut *tx, organization_id).await?;
            require_org(&mut *tx, organization_id, actor, false).await?;
            tx.find_org_member(organization_id, user_id)
                .await?
                .ok_or_else(|| not_a_member(organization_id, user_id))
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Memberships matching the filters. An organization filter requires the actor to
    /// belong to it; without one the query must be scoped to the actor's own user id.
    #[tracing::instrument(skip(self, query), fields(actor = %actor))]
    pub async fn list(
        &self,
        actor: Uuid,
        query: OrganizationMemberQuery,
    ) -> Result<Vec<OrganizationMember>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<OrganizationMember>, AppError> = async {
            match query.organization_id {
                Some(organization_id) => {
                    ensure_organization(&mut *tx, organization_id).await?;
                    require_org(&mut *tx, organization_id, actor, false).await?;
                }
                None if query.user_id == Some(actor) => {}
                None => {
                    return Err(AppError::Unauthorized(
                        "filter by an organization you belong to or by your own user id"
                            .to_string(),
                    ));
                }
            }
            tx.list_org_members(&query).await
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Changes a member's organization role. Demoting the last ADMIN is rejected.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, organization_id = %organization_id, user_id = %user_id))]
    pub async fn update_role(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
        request: UpdateOrganizationMemberRequest,
    ) -> Result<OrganizationMember, AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<OrganizationMember, AppError> = async {
            ensure_organization(&mut *tx, organization_id).await?;
            require_org(&mut *tx, organization_id, actor, true).await?;

            let members = tx.lock_org_members(organization_id).await?;
            let target = members
                .iter()
                .find(|m| m.user_id == user_id)
                .ok_or_else(|| not_a_member(organization_id, user_id))?;
            if request.role != OrgRole::Admin {
                guard_last_org_admin(&members, target)?;
            }

            tx.update_org_member_role(organization_id, user_id, request.role, now)
                .await?
                .ok_or_else(|| not_a_member(organization_id, user_id))
        }
        .await;

        let member = commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user_id, role = %member.role, "Organization member role updated");
        Ok(member)
    }

    /// Removes a member. ADMINs may remove anyone, other members only themselves;
    /// removing the last ADMIN is rejected.
    #[tracing::instrument(skip(self), fields(actor = %actor, organization_id = %organization_id, user_id = %user_id))]
    pub async fn remove(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            ensure_organization(&mut *tx, organization_id).await?;
            require_org(&mut *tx, organization_id, actor, actor != user_id).await?;

            let members = tx.lock_org_members(organization_id).await?;
            let target = members
                .iter()
                .find(|m| m.user_id == user_id)
                .ok_or_else(|| not_a_member(organization_id, user_id))?;
            guard_last_org_admin(&members, target)?;

            tx.delete_org_member(organization_id, user_id).await?;
            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user_id, "Organization member removed");
        Ok(())
    }

    /// Removes the actor from every organization at once. Rejected while the actor is
    /// the last ADMIN of any of them; returns how many memberships were dropped.
    #[tracing::instrument(skip(self), fields(actor = %actor))]
    pub async fn leave_all(&self, actor: Uuid) -> Result<u64, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<u64, AppError> = async {
            if tx.get_user(actor).await?.is_none() {
                return Err(AppError::not_found("User", actor));
            }
            let own = OrganizationMemberQuery {
                user_id: Some(actor),
                ..Default::default()
            };
            for membership in tx.list_org_members(&own).await? {
                let members = tx.lock_org_members(membership.organization_id).await?;
                guard_last_org_admin(&members, &membership)?;
            }
            tx.delete_org_members_by_user(actor).await
        }
        .await;

        let removed = commit_or_rollback(tx, result).await?;
        tracing::info!(removed, "Left all organizations");
        Ok(removed)
    }
}
