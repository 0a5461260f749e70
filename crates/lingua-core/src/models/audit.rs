use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of change an audit entry records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "audit_action", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Approve,
    Reject,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
        };
        f.write_str(name)
    }
}

/// Entity an audit entry refers to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "audit_entity_type", rename_all = "SCREAMING_SNAKE_CASE")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Project,
    ProjectMember,
    TranslationFile,
    Message,
    TranslationVersion,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Project => "PROJECT",
            EntityType::ProjectMember => "PROJECT_MEMBER",
            EntityType::TranslationFile => "TRANSLATION_FILE",
            EntityType::Message => "MESSAGE",
            EntityType::TranslationVersion => "TRANSLATION_VERSION",
        };
        f.write_str(name)
    }
}

/// Immutable record of an attributable change inside a project
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AuditLog {
    pub id: Uuid,
    pub project_id: Uuid,
    /// `None` once the acting user has been deleted
    pub user_id: Option<Uuid>,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    #[schema(value_type = Object)]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub action: AuditAction,
    pub entity_type: EntityType,
    pub entity_id: Uuid,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewAuditEntry {
    pub fn new(
        project_id: Uuid,
        user_id: Uuid,
        action: AuditAction,
        entity_type: EntityType,
        entity_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            project_id,
            user_id,
            action,
            entity_type,
            entity_id,
            details: serde_json::Value::Object(serde_json::Map::new()),
            created_at,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Filter for reading a project's audit trail (newest first)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AuditQuery {
    #[serde(default)]
    pub entity_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<i64>,
}
