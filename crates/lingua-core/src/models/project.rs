use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Translation project inside an organization
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Unique within the organization
    pub name: String,
    pub description: Option<String>,
    pub source_language: String,
    /// Ordered, duplicate-free
    pub target_languages: Vec<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn allows_language(&self, language_code: &str) -> bool {
        self.target_languages.iter().any(|l| l == language_code)
    }
}

/// Request DTO for creating a project
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Project name must be between 1 and 255 characters"
    ))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(min = 2, max = 16, message = "Language codes are 2 to 16 characters"))]
    pub source_language: String,
    #[validate(
        length(min = 1, message = "At least one target language is required"),
        custom(function = "validate_language_codes")
    )]
    pub target_languages: Vec<String>,
}

/// Request DTO for updating a project
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Project name must be between 1 and 255 characters"
    ))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 16, message = "Language codes are 2 to 16 characters"))]
    pub source_language: Option<String>,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "At least one target language is required"),
        custom(function = "validate_language_codes")
    )]
    pub target_languages: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub source_language: String,
    pub target_languages: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Field changes applied to a project; `None` leaves a field untouched
#[derive(Debug, Clone)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub source_language: Option<String>,
    pub target_languages: Option<Vec<String>>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate counts for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProjectStats {
    pub project_id: Uuid,
    pub name: String,
    pub files: i64,
    pub total_messages: i64,
    pub members: i64,
}

/// Every target language code must be 2 to 16 characters once trimmed.
fn validate_language_codes(codes: &[String]) -> Result<(), ValidationError> {
    for code in codes {
        let length = code.trim().chars().count();
        if !(2..=16).contains(&length) {
            let mut error = ValidationError::new("language_code");
            error.message = Some("Language codes are 2 to 16 characters".into());
            return Err(error);
        }
    }
    Ok(())
}

/// Trims codes and drops repeats, keeping first occurrences in order.
pub fn normalize_languages<I, S>(codes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut ordered: Vec<String> = Vec::new();
    for code in codes {
        let code = code.as_ref().trim();
        if !code.is_empty() && !ordered.iter().any(|c| c == code) {
            ordered.push(code.to_string());
        }
    }
    ordered
}
