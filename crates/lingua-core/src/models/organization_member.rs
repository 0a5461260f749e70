use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Role of a user inside an organization
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "org_role", rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgRole {
    /// Manages the organization and its membership
    Admin,
    #[default]
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Admin => "ADMIN",
            OrgRole::Member => "MEMBER",
        }
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership of a user in an organization; unique per (organization, user)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrganizationMember {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for adding a user to an organization
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddOrganizationMemberRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub role: OrgRole,
}

/// Request DTO for changing an organization member's role
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrganizationMemberRequest {
    pub role: OrgRole,
}

/// Filters for listing organization memberships; unset fields match everything
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct OrganizationMemberQuery {
    #[serde(default)]
    pub organization_id: Option<Uuid>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub role: Option<OrgRole>,
}

impl OrganizationMemberQuery {
    pub fn matches(&self, member: &OrganizationMember) -> bool {
        self.organization_id
            .map_or(true, |id| id == member.organization_id)
            && self.user_id.map_or(true, |id| id == member.user_id)
            && self.role.map_or(true, |role| role == member.role)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrganizationMember {
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: OrgRole,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_member() {
        let request: AddOrganizationMemberRequest =
            serde_json::from_value(serde_json::json!({ "user_id": Uuid::nil() })).unwrap();
        assert_eq!(request.role, OrgRole::Member);
        assert_eq!(serde_json::to_value(OrgRole::Admin).unwrap(), "ADMIN");
    }

    #[test]
    fn test_query_filters_combine() {
        let member = OrganizationMember {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: OrgRole::Member,
            created_at: Utc::now(),
            updated_at: None,
        };
        assert!(OrganizationMemberQuery::default().matches(&member));
        let query = OrganizationMemberQuery {
            organization_id: Some(member.organization_id),
            user_id: None,
            role: Some(OrgRole::Admin),
        };
        assert!(!query.matches(&member));
    }
}
