//! Role resolution and authorization
//!
//! Roles are always read from the membership row inside the caller's transaction, never
//! cached, so a role change is visible to the very next operation. Project roles follow
//! the configured tier order; organization roles are the fixed ADMIN/MEMBER pair.

use lingua_core::models::{OrgRole, OrganizationMember};
use lingua_core::{AccessLevel, AccessPolicy, AppError, Role};
use lingua_db::{MemberStore, OrganizationMemberStore, StoreTx};
use uuid::Uuid;

/// The actor's role in the project, `None` when the actor is not a member
pub async fn resolve_role(
    tx: &mut dyn StoreTx,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Role>, AppError> {
    Ok(tx
        .find_member(project_id, user_id)
        .await?
        .map(|member| member.role))
}

/// Resolves the actor's role and checks it against the tier the access level requires.
pub async fn require(
    tx: &mut dyn StoreTx,
    policy: &AccessPolicy,
    project_id: Uuid,
    actor: Uuid,
    level: AccessLevel,
) -> Result<Role, AppError> {
    let role = resolve_role(tx, project_id, actor).await?;
    policy.admit(role, level).map_err(|err| {
        tracing::debug!(
            project_id = %project_id,
            actor = %actor,
            level = %level,
            error = %err,
            "Access denied"
        );
        err
    })
}

/// Checks the actor belongs to the organization, and holds ADMIN when `admin_only`.
pub async fn require_org(
    tx: &mut dyn StoreTx,
    organization_id: Uuid,
    actor: Uuid,
    admin_only: bool,
) -> Result<OrganizationMember, AppError> {
    let denied = match tx.find_org_member(organization_id, actor).await? {
        Some(member) if !admin_only || member.role == OrgRole::Admin => return Ok(member),
        Some(member) => AppError::Unauthorized(format!(
            "organization role {} cannot manage this organization",
            member.role
        )),
        None => AppError::Unauthorized("user is not a member of this organization".to_string()),
    };
    tracing::debug!(
        organization_id = %organization_id,
        actor = %actor,
        error = %denied,
        "Organization access denied"
    );
    Err(denied)
}
