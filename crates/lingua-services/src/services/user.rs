use lingua_core::models::{NewUser, OrganizationMemberQuery, RegisterUserRequest, User};
use lingua_core::AppError;
use lingua_db::{commit_or_rollback, MemberStore, OrganizationMemberStore, UserStore};
use uuid::Uuid;
use validator::Validate;

use super::organization_member::guard_last_org_admin;
use crate::context::ServiceContext;

/// Users are referenced by every other entity; authentication happens elsewhere.
#[derive(Clone)]
pub struct UserService {
    ctx: ServiceContext,
}

impl UserService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, AppError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();
        let now = self.ctx.clock().now();

        let mut tx = self.ctx.store().begin().await?;
        let result = tx
            .insert_user(NewUser {
                email,
                name: request.name.trim().to_string(),
                created_at: now,
            })
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => {
                    AppError::Conflict("A user with this email already exists".to_string())
                }
                other => other,
            });

        let user = commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, user_id: Uuid) -> Result<User, AppError> {
        let mut tx = self.ctx.store().begin().await?;
        let result = tx
            .get_user(user_id)
            .await
            .and_then(|found| found.ok_or_else(|| AppError::not_found("User", user_id)));
        commit_or_rollback(tx, result).await
    }

    /// Deletes the actor's own account. Content they created stays with its creator
    /// reference cleared. Rejected while they are the last top-tier member of a project
    /// or the last ADMIN of an organization.
    #[tracing::instrument(skip(self), fields(actor = %actor, user_id = %user_id))]
    pub async fn delete(&self, actor: Uuid, user_id: Uuid) -> Result<(), AppError> {
        if actor != user_id {
            return Err(AppError::Unauthorized(
                "users may only delete their own account".to_string(),
            ));
        }
        let policy = self.ctx.policy();

        let mut tx = self.ctx.store().begin().await?;
        let result: Result<(), AppError> = async {
            if tx.get_user(user_id).await?.is_none() {
                return Err(AppError::not_found("User", user_id));
            }
            for membership in tx.memberships_of_user(user_id).await? {
                if !policy.is_top_tier(&membership.role) {
                    continue;
                }
                let members = tx.lock_members(membership.project_id).await?;
                let top_tier = members
                    .iter()
                    .filter(|m| policy.is_top_tier(&m.role))
                    .count();
                if top_tier <= 1 {
                    return Err(AppError::BusinessRuleViolation(format!(
                        "User is the last top-tier member of project {}",
                        membership.project_id
                    )));
                }
            }
            let own = OrganizationMemberQuery {
                user_id: Some(user_id),
                ..Default::default()
            };
            for membership in tx.list_org_members(&own).await? {
                let members = tx.lock_org_members(membership.organization_id).await?;
                guard_last_org_admin(&members, &membership)?;
            }
            tx.delete_user(user_id).await?;
            Ok(())
        }
        .await;

        commit_or_rollback(tx, result).await?;
        tracing::info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
