//! Version Snapshotter
//!
//! Only the message update workflow calls this: a snapshot always comes with its own
//! version-number increment, in the same transaction.

use chrono::{DateTime, Utc};
use lingua_core::models::{NewTranslationVersion, Snapshot, TranslationVersion};
use lingua_core::AppError;
use lingua_db::{FileStore, MessageStore, StoreTx, VersionStore};
use uuid::Uuid;

/// Advances the file's version counter and stores the post-update state of every message
/// under the new number. Must run after the message change it versions.
pub(crate) async fn snapshot_file(
    tx: &mut dyn StoreTx,
    file_id: Uuid,
    actor: Uuid,
    now: DateTime<Utc>,
) -> Result<TranslationVersion, AppError> {
    let version_number = tx.bump_file_version(file_id, now).await?;
    let messages = tx.list_messages(file_id, None).await?;
    let snapshot = Snapshot::from_messages(&messages);

    let version = tx
        .insert_version(NewTranslationVersion {
            file_id,
            version_number,
            snapshot,
            created_by: actor,
            created_at: now,
        })
        .await?;

    tracing::debug!(
        file_id = %file_id,
        version_number,
        keys = version.snapshot.len(),
        "Version snapshot stored"
    );
    Ok(version)
}
