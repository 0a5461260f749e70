use lingua_core::models::{
    AddMemberRequest, AuditAction, EntityType, NewAuditEntry, NewProjectMember, ProjectMember,
    UpdateMemberRoleRequest,
};
use lingua_core::{AccessLevel, AccessPolicy, AppError, Role};
use lingua_db::{commit_or_rollback, MemberStore, ProjectStore, StoreTx, UserStore};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::access::{require, resolve_role};
use crate::audit::record;
use crate::context::ServiceContext;

/// Project memberships and the last-top-tier-member guard.
#[derive(Clone)]
pub struct MemberService {
    ctx: ServiceContext,
}

async fn ensure_project(tx: &mut dyn StoreTx, project_id: Uuid) -> Result<(), AppError> {
    match tx.get_project(project_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("Project", project_id)),
    }
}

/// Administrators may hand out their own tier at most.
fn check_grant(policy: &AccessPolicy, granter: &Role, requested: &Role) -> Result<(), AppError> {
    if policy.hierarchy().at_least(granter, requested) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "role {} cannot grant the higher role {}",
            granter, requested
        )))
    }
}

/// Members below the target's tier cannot change or remove it.
fn check_outranks(
    policy: &AccessPolicy,
    granter: &Role,
    target: &ProjectMember,
) -> Result<(), AppError> {
    if policy.hierarchy().at_least(granter, &target.role) {
        Ok(())
    } else {
        Err(AppError::Unauthorized(format!(
            "role {} cannot manage a member holding the higher role {}",
            granter, target.role
        )))
    }
}

/// Fails when `target` is the only member left at the top tier. Expects the
/// project's member rows to be locked by the caller.
fn guard_last_top_tier(
    policy: &AccessPolicy,
    members: &[ProjectMember],
    target: &ProjectMember,
) -> Result<(), AppError> {
    if !policy.is_top_tier(&target.role) {
        return Ok(());
    }
    let top_tier = members
        .iter()
        .filter(|m| policy.is_top_tier(&m.role))
        .count();
    if top_tier <= 1 {
        return Err(AppError::BusinessRuleViolation(format!(
            "A project must keep at least one {} member",
            policy.hierarchy().top()
        )));
    }
    Ok(())
}

impl MemberService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self, request), fields(actor = %actor, project_id = %project_id))]
    pub async fn add(
        &self,
        actor: Uuid,
        project_id: Uuid,
        request: AddMemberRequest,
    ) -> Result<ProjectMember, AppError> {
        request.validate()?;
        let role = self.ctx.policy().assignable(&request.role)?;
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<ProjectMember, AppError> = async {
            ensure_project(&mut *tx, project_id).await?;
            let granter = require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;
            check_grant(self.ctx.policy(), &granter, &role)?;

            if tx.get_user(request.user_id).await?.is_none() {
                return Err(AppError::not_found("User", request.user_id));
            }
            if tx.find_member(project_id, request.user_id).await?.is_some() {
                return Err(AppError::Conflict(format!(
                    "User {} is already a member of this project",
                    request.user_id
                )));
            }

            let member = tx
                .insert_member(NewProjectMember {
                    project_id,
                    user_id: request.user_id,
                    role: role.clone(),
                    created_at: now,
                })
                .await?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    project_id,
                    actor,
                    AuditAction::Create,
                    EntityType::ProjectMember,
                    member.id,
                    now,
                )
                .with_details(json!({ "user_id": member.user_id, "role": member.role })),
            )
            .await?;

            Ok(member)
        }
        .await;

        let member = commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %member.user_id, role = %member.role, "Member added");
        Ok(member)
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn get(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<ProjectMember, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<ProjectMember, AppError> = async {
            ensure_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.find_member(project_id, user_id).await?.ok_or_else(|| {
                AppError::NotFound(format!(
                    "User {} is not a member of project {}",
                    user_id, project_id
                ))
            })
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// Changes a member's tier. The actor must hold at least the target's current tier
    /// and the requested one; demoting the last top-tier member is rejected.
    #[tracing::instrument(skip(self, request), fields(actor = %actor, project_id = %project_id, user_id = %user_id))]
    pub async fn update_role(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
        request: UpdateMemberRoleRequest,
    ) -> Result<ProjectMember, AppError> {
        request.validate()?;
        let role = self.ctx.policy().assignable(&request.role)?;
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<ProjectMember, AppError> = async {
            ensure_project(&mut *tx, project_id).await?;
            let granter = require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;
            check_grant(self.ctx.policy(), &granter, &role)?;

            let members = tx.lock_members(project_id).await?;
            let target = members
                .iter()
                .find(|m| m.user_id == user_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "User {} is not a member of project {}",
                        user_id, project_id
                    ))
                })?;
            check_outranks(self.ctx.policy(), &granter, target)?;
            if !self.ctx.policy().is_top_tier(&role) {
                guard_last_top_tier(self.ctx.policy(), &members, target)?;
            }
            let previous = target.role.clone();

            let member = tx
                .update_member_role(project_id, user_id, &role, now)
                .await?
                .ok_or_else(|| AppError::not_found("Project member", user_id))?;

            record(
                &mut *tx,
                NewAuditEntry::new(
                    project_id,
                    actor,
                    AuditAction::Update,
                    EntityType::ProjectMember,
                    member.id,
                    now,
                )
                .with_details(json!({
                    "user_id": user_id,
                    "before": previous,
                    "after": member.role,
                })),
            )
            .await?;

            Ok(member)
        }
        .await;

        let member = commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user_id, role = %member.role, "Member role updated");
        Ok(member)
    }

    /// Removes a member the actor does not rank below. Removing the last top-tier member
    /// is rejected.
    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id, user_id = %user_id))]
    pub async fn remove(
        &self,
        actor: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            ensure_project(&mut *tx, project_id).await?;
            let granter = require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Administer,
            )
            .await?;

            let members = tx.lock_members(project_id).await?;
            let target = members
                .iter()
                .find(|m| m.user_id == user_id)
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "User {} is not a member of project {}",
                        user_id, project_id
                    ))
                })?;
            check_outranks(self.ctx.policy(), &granter, target)?;
            guard_last_top_tier(self.ctx.policy(), &members, target)?;

            tx.delete_member(project_id, user_id).await?;
            record(
                &mut *tx,
                NewAuditEntry::new(
                    project_id,
                    actor,
                    AuditAction::Delete,
                    EntityType::ProjectMember,
                    target.id,
                    now,
                )
                .with_details(json!({ "user_id": user_id, "role": target.role })),
            )
            .await?;
            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user_id, "Member removed");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(actor = %actor, project_id = %project_id))]
    pub async fn list(
        &self,
        actor: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<ProjectMember>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result: Result<Vec<ProjectMember>, AppError> = async {
            ensure_project(&mut *tx, project_id).await?;
            require(
                &mut *tx,
                self.ctx.policy(),
                project_id,
                actor,
                AccessLevel::Read,
            )
            .await?;
            tx.list_members(project_id).await
        }
        .await;
        commit_or_rollback(tx, result).await
    }

    /// The user's current role in the project, `None` for non-members.
    #[tracing::instrument(skip(self))]
    pub async fn role_of(&self, project_id: Uuid, user_id: Uuid) -> Result<Option<Role>, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result = resolve_role(&mut *tx, project_id, user_id).await;
        commit_or_rollback(tx, result).await
    }
}
