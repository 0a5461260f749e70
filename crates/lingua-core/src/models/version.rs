use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use super::message::{Message, MessageStatus};

/// State of one message at the instant a version was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SnapshotEntry {
    pub value: Option<String>,
    pub status: MessageStatus,
    pub comment: Option<String>,
}

/// Every message of a file keyed by message key.
///
/// Serializes as a plain JSON object, which is what the `snapshot` column stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, SnapshotEntry>);

impl Snapshot {
    pub fn from_messages<'a, I>(messages: I) -> Self
    where
        I: IntoIterator<Item = &'a Message>,
    {
        Snapshot(
            messages
                .into_iter()
                .map(|m| {
                    (
                        m.key.clone(),
                        SnapshotEntry {
                            value: m.value.clone(),
                            status: m.status,
                            comment: m.comment.clone(),
                        },
                    )
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotEntry> {
        self.0.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &BTreeMap<String, SnapshotEntry> {
        &self.0
    }
}

/// Immutable, numbered snapshot of a file. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TranslationVersion {
    pub id: Uuid,
    pub file_id: Uuid,
    pub version_number: i32,
    #[schema(value_type = Object)]
    pub snapshot: Snapshot,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTranslationVersion {
    pub file_id: Uuid,
    pub version_number: i32,
    pub snapshot: Snapshot,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Entry of a file's version history
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VersionRecord {
    pub version_number: i32,
    #[schema(value_type = Object)]
    pub snapshot: Snapshot,
    pub created_at: DateTime<Utc>,
}

impl From<TranslationVersion> for VersionRecord {
    fn from(version: TranslationVersion) -> Self {
        VersionRecord {
            version_number: version.version_number,
            snapshot: version.snapshot,
            created_at: version.created_at,
        }
    }
}
