use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::roles::Role;

/// Membership of a user in a project; unique per (project, user)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for adding a member
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub role: String,
}

/// Request DTO for changing a member's role
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateMemberRoleRequest {
    #[validate(length(min = 1, max = 64))]
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct NewProjectMember {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
