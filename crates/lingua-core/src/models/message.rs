use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Review status of a message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "message_status", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    Pending,
    Approved,
    Rejected,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "PENDING",
            MessageStatus::Approved => "APPROVED",
            MessageStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(MessageStatus::Pending),
            "APPROVED" => Ok(MessageStatus::Approved),
            "REJECTED" => Ok(MessageStatus::Rejected),
            other => Err(format!("unknown message status '{}'", other)),
        }
    }
}

/// One translatable entry of a file; unique per (file, key)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Message {
    pub id: Uuid,
    pub file_id: Uuid,
    pub key: String,
    /// `None` until translated
    pub value: Option<String>,
    pub comment: Option<String>,
    pub status: MessageStatus,
    pub created_by: Option<Uuid>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating a message
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 500, message = "Key must be between 1 and 500 characters"))]
    pub key: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub value: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

/// Request DTO for updating a message; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMessageRequest {
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub value: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

impl UpdateMessageRequest {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.comment.is_none()
    }
}

/// Request DTO for rejecting a message
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct RejectMessageRequest {
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub file_id: Uuid,
    pub key: String,
    pub value: Option<String>,
    pub comment: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}
