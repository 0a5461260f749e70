use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::message::{Message, MessageStatus};

/// Per-language file of a project; unique per (project, language_code)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TranslationFile {
    pub id: Uuid,
    pub project_id: Uuid,
    pub language_code: String,
    pub language_name: String,
    /// Starts at 0; only the message update workflow advances it
    pub current_version: i32,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request DTO for creating a translation file
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateFileRequest {
    #[validate(length(min = 2, max = 16, message = "Language codes are 2 to 16 characters"))]
    pub language_code: String,
    #[validate(length(
        min = 1,
        max = 255,
        message = "Language name must be between 1 and 255 characters"
    ))]
    pub language_name: String,
}

/// Request DTO for updating file metadata
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateFileRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Language name must be between 1 and 255 characters"
    ))]
    pub language_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTranslationFile {
    pub project_id: Uuid,
    pub language_code: String,
    pub language_name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Export payload of a file: its language metadata and every message
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileExport {
    pub language_code: String,
    pub language_name: String,
    pub version: i32,
    pub messages: Vec<ExportedMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExportedMessage {
    pub key: String,
    pub value: Option<String>,
    pub status: MessageStatus,
    pub comment: Option<String>,
}

impl From<Message> for ExportedMessage {
    fn from(message: Message) -> Self {
        ExportedMessage {
            key: message.key,
            value: message.value,
            status: message.status,
            comment: message.comment,
        }
    }
}

impl FileExport {
    pub fn new(file: TranslationFile, messages: Vec<Message>) -> Self {
        FileExport {
            language_code: file.language_code,
            language_name: file.language_name,
            version: file.current_version,
            messages: messages.into_iter().map(ExportedMessage::from).collect(),
        }
    }
}
