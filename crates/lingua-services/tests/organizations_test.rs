//! Organizations and their ADMIN/MEMBER memberships.

mod helpers;

use helpers::{world, TestWorld};
use lingua_core::models::{
    AddOrganizationMemberRequest, CreateOrganizationRequest, CreateProjectRequest, OrgRole,
    Organization, OrganizationMemberQuery, UpdateOrganizationMemberRequest,
    UpdateOrganizationRequest, User,
};
use lingua_core::AppError;

async fn organization(w: &TestWorld, owner: &User, name: &str) -> Organization {
    w.services
        .organizations
        .create(
            owner.id,
            CreateOrganizationRequest {
                name: name.to_string(),
                description: None,
            },
        )
        .await
        .unwrap()
}

fn in_organization(organization: &Organization) -> OrganizationMemberQuery {
    OrganizationMemberQuery {
        organization_id: Some(organization.id),
        ..Default::default()
    }
}

fn rename(name: &str) -> UpdateOrganizationRequest {
    UpdateOrganizationRequest {
        name: Some(name.to_string()),
        description: None,
    }
}

#[tokio::test]
async fn test_creator_becomes_admin_and_name_lookup() {
    let w = world();
    let alice = w.user("Alice").await;
    let acme = organization(&w, &alice, "Acme").await;

    let members = w
        .services
        .organization_members
        .list(alice.id, in_organization(&acme))
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, alice.id);
    assert_eq!(members[0].role, OrgRole::Admin);

    let found = w.services.organizations.get_by_name("acme").await.unwrap();
    assert_eq!(found.id, acme.id);
    assert!(matches!(
        w.services.organizations.get_by_name("Globex").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_only_admins_modify_organization() {
    let w = world();
    let alice = w.user("Alice").await;
    let mallory = w.user("Mallory").await;
    let project = w.project(&alice, &["es"]).await;
    let organization_id = project.organization_id;

    let outsider = w
        .services
        .organizations
        .update(mallory.id, organization_id, rename("Mallory Inc"))
        .await;
    assert!(matches!(outsider, Err(AppError::Unauthorized(_))));

    w.org_member(&alice, organization_id, &mallory, OrgRole::Member)
        .await;
    let member = w
        .services
        .organizations
        .update(mallory.id, organization_id, rename("Mallory Inc"))
        .await;
    assert!(matches!(member, Err(AppError::Unauthorized(_))));
    assert!(matches!(
        w.services.organizations.delete(mallory.id, organization_id).await,
        Err(AppError::Unauthorized(_))
    ));

    w.services
        .organization_members
        .update_role(
            alice.id,
            organization_id,
            mallory.id,
            UpdateOrganizationMemberRequest {
                role: OrgRole::Admin,
            },
        )
        .await
        .unwrap();
    let renamed = w
        .services
        .organizations
        .update(mallory.id, organization_id, rename("Acme Corp"))
        .await
        .unwrap();
    assert_eq!(renamed.name, "Acme Corp");
    assert_eq!(
        w.services
            .organizations
            .list_for_creator(alice.id)
            .await
            .unwrap()
            .len(),
        1
    );

    w.services
        .organizations
        .delete(mallory.id, organization_id)
        .await
        .unwrap();
    assert!(matches!(
        w.services.projects.get(alice.id, project.id).await,
        Err(AppError::NotFound(_))
    ));
    let own = OrganizationMemberQuery {
        user_id: Some(mallory.id),
        ..Default::default()
    };
    assert!(w
        .services
        .organization_members
        .list(mallory.id, own)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_last_organization_admin_is_protected() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;

    let leave = w
        .services
        .organization_members
        .remove(alice.id, acme.id, alice.id)
        .await;
    assert!(matches!(leave, Err(AppError::BusinessRuleViolation(_))));

    let demote = w
        .services
        .organization_members
        .update_role(
            alice.id,
            acme.id,
            alice.id,
            UpdateOrganizationMemberRequest {
                role: OrgRole::Member,
            },
        )
        .await;
    assert!(matches!(demote, Err(AppError::BusinessRuleViolation(_))));
    assert!(matches!(
        w.services.organization_members.leave_all(alice.id).await,
        Err(AppError::BusinessRuleViolation(_))
    ));

    w.org_member(&alice, acme.id, &bob, OrgRole::Admin).await;
    let demoted = w
        .services
        .organization_members
        .update_role(
            alice.id,
            acme.id,
            alice.id,
            UpdateOrganizationMemberRequest {
                role: OrgRole::Member,
            },
        )
        .await
        .unwrap();
    assert_eq!(demoted.role, OrgRole::Member);
    assert!(demoted.updated_at.is_some());

    let admins = OrganizationMemberQuery {
        organization_id: Some(acme.id),
        role: Some(OrgRole::Admin),
        ..Default::default()
    };
    let remaining = w
        .services
        .organization_members
        .list(alice.id, admins)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].user_id, bob.id);
}

#[tokio::test]
async fn test_members_may_only_remove_themselves() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let carol = w.user("Carol").await;
    let acme = organization(&w, &alice, "Acme").await;
    w.org_member(&alice, acme.id, &bob, OrgRole::Member).await;
    w.org_member(&alice, acme.id, &carol, OrgRole::Member).await;

    let kick = w
        .services
        .organization_members
        .remove(carol.id, acme.id, bob.id)
        .await;
    assert!(matches!(kick, Err(AppError::Unauthorized(_))));

    w.services
        .organization_members
        .remove(carol.id, acme.id, carol.id)
        .await
        .unwrap();
    w.services
        .organization_members
        .remove(alice.id, acme.id, bob.id)
        .await
        .unwrap();

    let members = w
        .services
        .organization_members
        .list(alice.id, in_organization(&acme))
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert!(matches!(
        w.services
            .organization_members
            .get(alice.id, acme.id, bob.id)
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_add_rejects_duplicates_and_unknown_users() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;
    w.org_member(&alice, acme.id, &bob, OrgRole::Member).await;

    let again = w
        .services
        .organization_members
        .add(
            alice.id,
            acme.id,
            AddOrganizationMemberRequest {
                user_id: bob.id,
                role: OrgRole::Admin,
            },
        )
        .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let ghost = w
        .services
        .organization_members
        .add(
            alice.id,
            acme.id,
            AddOrganizationMemberRequest {
                user_id: uuid::Uuid::new_v4(),
                role: OrgRole::Member,
            },
        )
        .await;
    assert!(matches!(ghost, Err(AppError::NotFound(_))));

    let by_member = w
        .services
        .organization_members
        .add(
            bob.id,
            acme.id,
            AddOrganizationMemberRequest {
                user_id: w.user("Dave").await.id,
                role: OrgRole::Member,
            },
        )
        .await;
    assert!(matches!(by_member, Err(AppError::Unauthorized(_))));

    let fetched = w
        .services
        .organization_members
        .get(bob.id, acme.id, bob.id)
        .await
        .unwrap();
    assert_eq!(fetched.role, OrgRole::Member);
}

#[tokio::test]
async fn test_listing_is_scoped_to_own_memberships() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;
    let globex = organization(&w, &bob, "Globex").await;
    w.org_member(&bob, globex.id, &alice, OrgRole::Member).await;

    let own = OrganizationMemberQuery {
        user_id: Some(alice.id),
        ..Default::default()
    };
    let mine = w
        .services
        .organization_members
        .list(alice.id, own)
        .await
        .unwrap();
    let organizations: Vec<_> = mine.iter().map(|m| m.organization_id).collect();
    assert_eq!(organizations, vec![acme.id, globex.id]);

    let someone_else = OrganizationMemberQuery {
        user_id: Some(alice.id),
        ..Default::default()
    };
    assert!(matches!(
        w.services
            .organization_members
            .list(bob.id, someone_else)
            .await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        w.services
            .organization_members
            .list(bob.id, in_organization(&acme))
            .await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn test_leave_all_drops_every_membership() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;
    let globex = organization(&w, &alice, "Globex").await;
    w.org_member(&alice, acme.id, &bob, OrgRole::Member).await;
    w.org_member(&alice, globex.id, &bob, OrgRole::Admin).await;

    assert_eq!(
        w.services.organization_members.leave_all(bob.id).await.unwrap(),
        2
    );
    let members = w
        .services
        .organization_members
        .list(alice.id, in_organization(&globex))
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn test_organization_outlives_its_creator() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;

    let denied = w.services.users.delete(alice.id, alice.id).await;
    assert!(matches!(denied, Err(AppError::BusinessRuleViolation(_))));

    w.org_member(&alice, acme.id, &bob, OrgRole::Admin).await;
    w.services.users.delete(alice.id, alice.id).await.unwrap();

    let renamed = w
        .services
        .organizations
        .update(bob.id, acme.id, rename("Acme Corp"))
        .await
        .unwrap();
    assert_eq!(renamed.created_by, None);
    assert_eq!(renamed.name, "Acme Corp");
}

#[tokio::test]
async fn test_project_creation_requires_organization_membership() {
    let w = world();
    let alice = w.user("Alice").await;
    let bob = w.user("Bob").await;
    let acme = organization(&w, &alice, "Acme").await;
    let request = || CreateProjectRequest {
        name: "Docs".to_string(),
        description: None,
        source_language: "en".to_string(),
        target_languages: vec!["de".to_string()],
    };

    let outsider = w.services.projects.create(bob.id, acme.id, request()).await;
    assert!(matches!(outsider, Err(AppError::Unauthorized(_))));

    w.org_member(&alice, acme.id, &bob, OrgRole::Member).await;
    let project = w
        .services
        .projects
        .create(bob.id, acme.id, request())
        .await
        .unwrap();
    assert_eq!(
        w.services.members.role_of(project.id, bob.id).await.unwrap(),
        Some(lingua_core::Role::new("ADMIN"))
    );
}
