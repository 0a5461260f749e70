//! Translation files: language rules, export and version history.

mod helpers;

use helpers::world;
use lingua_core::models::{
    CreateFileRequest, MessageStatus, UpdateFileRequest, UpdateMessageRequest,
};
use lingua_core::AppError;

fn file_request(code: &str) -> CreateFileRequest {
    CreateFileRequest {
        language_code: code.to_string(),
        language_name: code.to_uppercase(),
    }
}

#[tokio::test]
async fn test_create_file_enforces_target_languages_and_uniqueness() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es", "fr"]).await;

    let file = w
        .services
        .files
        .create(alice.id, project.id, file_request("es"))
        .await
        .unwrap();
    assert_eq!(file.language_code, "es");
    assert_eq!(file.current_version, 0);

    let german = w
        .services
        .files
        .create(alice.id, project.id, file_request("de"))
        .await;
    assert!(matches!(german, Err(AppError::BusinessRuleViolation(_))));

    let again = w
        .services
        .files
        .create(alice.id, project.id, file_request("es"))
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let listed = w.services.files.list(alice.id, project.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    let fetched = w.services.files.get(alice.id, file.id).await.unwrap();
    assert_eq!(fetched.id, file.id);
}

#[tokio::test]
async fn test_create_file_for_missing_project_is_not_found() {
    let w = world();
    let alice = w.user("Alice").await;

    let result = w
        .services
        .files
        .create(alice.id, uuid::Uuid::new_v4(), file_request("es"))
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_viewer_cannot_create_files() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let viewer = w.member(&owner, &project, "Vic", "VIEWER").await;

    let result = w
        .services
        .files
        .create(viewer.id, project.id, file_request("es"))
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn test_export_lists_messages_with_current_version() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let file = w.file(&alice, &project, "es").await;
    let greeting = w.message(&alice, &file, "greeting", Some("Hello")).await;
    w.message(&alice, &file, "farewell", Some("Adios")).await;
    w.services
        .messages
        .update(
            alice.id,
            greeting.id,
            UpdateMessageRequest {
                value: Some("Hola".to_string()),
                comment: None,
            },
        )
        .await
        .unwrap();
    w.services.messages.approve(alice.id, greeting.id).await.unwrap();

    let export = w.services.files.export(alice.id, file.id).await.unwrap();
    assert_eq!(export.language_code, "es");
    assert_eq!(export.version, 1);
    assert_eq!(export.messages.len(), 2);
    assert_eq!(export.messages[0].key, "greeting");
    assert_eq!(export.messages[0].value.as_deref(), Some("Hola"));
    assert_eq!(export.messages[0].status, MessageStatus::Approved);
    assert_eq!(export.messages[1].key, "farewell");
}

#[tokio::test]
async fn test_get_version_returns_snapshot_or_not_found() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let file = w.file(&alice, &project, "es").await;
    let message = w.message(&alice, &file, "greeting", Some("Hello")).await;
    for value in ["Hola", "Buenas"] {
        w.services
            .messages
            .update(
                alice.id,
                message.id,
                UpdateMessageRequest {
                    value: Some(value.to_string()),
                    comment: None,
                },
            )
            .await
            .unwrap();
    }

    let first = w.services.files.get_version(alice.id, file.id, 1).await.unwrap();
    assert_eq!(first.version_number, 1);
    assert_eq!(first.created_by, Some(alice.id));
    assert_eq!(
        first.snapshot.get("greeting").unwrap().value.as_deref(),
        Some("Hola")
    );

    let history = w
        .services
        .files
        .version_history(alice.id, file.id)
        .await
        .unwrap();
    let numbers: Vec<i32> = history.iter().map(|v| v.version_number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let missing = w.services.files.get_version(alice.id, file.id, 3).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_update_file_renames_language() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let file = w.file(&alice, &project, "es").await;

    let renamed = w
        .services
        .files
        .update(
            alice.id,
            file.id,
            UpdateFileRequest {
                language_name: Some("Español".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.language_name, "Español");

    let empty = w
        .services
        .files
        .update(alice.id, file.id, UpdateFileRequest::default())
        .await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_delete_file_removes_messages_and_versions() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let file = w.file(&alice, &project, "es").await;
    let message = w.message(&alice, &file, "greeting", Some("Hello")).await;
    w.services
        .messages
        .update(
            alice.id,
            message.id,
            UpdateMessageRequest {
                value: Some("Hola".to_string()),
                comment: None,
            },
        )
        .await
        .unwrap();

    w.services.files.delete(alice.id, file.id).await.unwrap();

    assert!(w.stored_file(file.id).await.is_none());
    assert!(w.stored_versions(file.id).await.is_empty());
    assert!(matches!(
        w.services.messages.get(alice.id, message.id).await,
        Err(AppError::NotFound(_))
    ));

    // The language is free again
    w.file(&alice, &project, "es").await;
}
