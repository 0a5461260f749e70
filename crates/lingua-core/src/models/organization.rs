use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Organization owning a set of projects
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Nulled when the creating user is deleted
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating an organization
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Organization name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

/// Request DTO for updating an organization
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateOrganizationRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Organization name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied to an organization; `None` leaves a field untouched
#[derive(Debug, Clone)]
pub struct OrganizationChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}
