//! Membership management and the last-top-tier-member guard.

mod helpers;

use helpers::{four_tier_policy, world, world_with};
use lingua_core::models::{AddMemberRequest, AuditAction, EntityType, UpdateMemberRoleRequest};
use lingua_core::{AppError, Role};

#[tokio::test]
async fn test_last_lead_cannot_be_removed_until_another_exists() {
    let w = world_with(four_tier_policy(), false);
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;

    let role = w.services.members.role_of(project.id, alice.id).await.unwrap();
    assert_eq!(role, Some(Role::new("LEAD")));

    let result = w.services.members.remove(alice.id, project.id, alice.id).await;
    assert!(matches!(result, Err(AppError::BusinessRuleViolation(_))));

    let bob = w.member(&alice, &project, "Bob", "LEAD").await;
    w.services
        .members
        .remove(alice.id, project.id, alice.id)
        .await
        .unwrap();

    assert_eq!(
        w.services.members.role_of(project.id, alice.id).await.unwrap(),
        None
    );
    let members = w.services.members.list(bob.id, project.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, bob.id);
}

#[tokio::test]
async fn test_last_lead_cannot_be_demoted() {
    let w = world_with(four_tier_policy(), false);
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;

    let result = w
        .services
        .members
        .update_role(
            alice.id,
            project.id,
            alice.id,
            UpdateMemberRoleRequest {
                role: "reviewer".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::BusinessRuleViolation(_))));

    // Re-asserting the top tier is not a demotion
    w.services
        .members
        .update_role(
            alice.id,
            project.id,
            alice.id,
            UpdateMemberRoleRequest {
                role: "LEAD".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_role_records_before_and_after() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let tess = w.member(&owner, &project, "Tess", "TRANSLATOR").await;

    let member = w
        .services
        .members
        .update_role(
            owner.id,
            project.id,
            tess.id,
            UpdateMemberRoleRequest {
                role: "reviewer".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(member.role, Role::new("REVIEWER"));

    let rows = w.audit_rows(project.id).await;
    assert_eq!(rows[0].action, AuditAction::Update);
    assert_eq!(rows[0].entity_type, EntityType::ProjectMember);
    assert_eq!(rows[0].details["before"], "TRANSLATOR");
    assert_eq!(rows[0].details["after"], "REVIEWER");
}

#[tokio::test]
async fn test_duplicate_membership_conflicts() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let tess = w.member(&owner, &project, "Tess", "TRANSLATOR").await;

    let result = w
        .services
        .members
        .add(
            owner.id,
            project.id,
            AddMemberRequest {
                user_id: tess.id,
                role: "VIEWER".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let member = w.services.members.get(owner.id, project.id, tess.id).await.unwrap();
    assert_eq!(member.role, Role::new("TRANSLATOR"));
}

#[tokio::test]
async fn test_unknown_role_is_rejected() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let newcomer = w.user("Newcomer").await;

    let result = w
        .services
        .members
        .add(
            owner.id,
            project.id,
            AddMemberRequest {
                user_id: newcomer.id,
                role: "OWNER".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::BusinessRuleViolation(_))));
}

#[tokio::test]
async fn test_cannot_grant_above_own_role() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let lead = w.member(&owner, &project, "Lee", "LEAD").await;
    let newcomer = w.user("Newcomer").await;

    let result = w
        .services
        .members
        .add(
            lead.id,
            project.id,
            AddMemberRequest {
                user_id: newcomer.id,
                role: "ADMIN".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));

    w.services
        .members
        .add(
            lead.id,
            project.id,
            AddMemberRequest {
                user_id: newcomer.id,
                role: "LEAD".to_string(),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_only_administrators_manage_members() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;
    let reviewer = w.member(&owner, &project, "Rita", "REVIEWER").await;
    let newcomer = w.user("Newcomer").await;

    let result = w
        .services
        .members
        .add(
            reviewer.id,
            project.id,
            AddMemberRequest {
                user_id: newcomer.id,
                role: "VIEWER".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::Unauthorized(_))));

    let removal = w.services.members.remove(reviewer.id, project.id, owner.id).await;
    assert!(matches!(removal, Err(AppError::Unauthorized(_))));
}

#[tokio::test]
async fn test_adding_unknown_user_is_not_found() {
    let w = world();
    let owner = w.user("Owner").await;
    let project = w.project(&owner, &["es"]).await;

    let result = w
        .services
        .members
        .add(
            owner.id,
            project.id,
            AddMemberRequest {
                user_id: uuid::Uuid::new_v4(),
                role: "VIEWER".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_lower_tier_cannot_demote_or_remove_higher_tier() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let bob = w.member(&alice, &project, "Bob", "LEAD").await;

    let demotion = w
        .services
        .members
        .update_role(
            bob.id,
            project.id,
            alice.id,
            UpdateMemberRoleRequest {
                role: "VIEWER".to_string(),
            },
        )
        .await;
    assert!(matches!(demotion, Err(AppError::Unauthorized(_))));

    let removal = w.services.members.remove(bob.id, project.id, alice.id).await;
    assert!(matches!(removal, Err(AppError::Unauthorized(_))));

    assert_eq!(
        w.services.members.role_of(project.id, alice.id).await.unwrap(),
        Some(Role::new("ADMIN"))
    );
    let members = w.services.members.list(alice.id, project.id).await.unwrap();
    assert_eq!(members.len(), 2);
}

#[tokio::test]
async fn test_sole_admin_is_protected_even_with_leads_present() {
    let w = world();
    let alice = w.user("Alice").await;
    let project = w.project(&alice, &["es"]).await;
    let bob = w.member(&alice, &project, "Bob", "LEAD").await;

    let leave = w.services.members.remove(alice.id, project.id, alice.id).await;
    assert!(matches!(leave, Err(AppError::BusinessRuleViolation(_))));

    let step_down = w
        .services
        .members
        .update_role(
            alice.id,
            project.id,
            alice.id,
            UpdateMemberRoleRequest {
                role: "LEAD".to_string(),
            },
        )
        .await;
    assert!(matches!(step_down, Err(AppError::BusinessRuleViolation(_))));

    // A LEAD may still manage members at or below its own tier
    let carol = w.member(&bob, &project, "Carol", "TRANSLATOR").await;
    w.services
        .members
        .remove(bob.id, project.id, carol.id)
        .await
        .unwrap();

    w.services
        .members
        .update_role(
            alice.id,
            project.id,
            bob.id,
            UpdateMemberRoleRequest {
                role: "ADMIN".to_string(),
            },
        )
        .await
        .unwrap();
    w.services
        .members
        .remove(alice.id, project.id, alice.id)
        .await
        .unwrap();
    assert_eq!(
        w.services.members.role_of(project.id, bob.id).await.unwrap(),
        Some(Role::new("ADMIN"))
    );
}
