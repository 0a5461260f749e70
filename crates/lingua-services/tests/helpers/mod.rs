//! Shared fixtures for the service tests. Everything runs against `MemoryStore`.

#![allow(dead_code)]

use lingua_core::models::{
    AddMemberRequest, AddOrganizationMemberRequest, AuditLog, AuditQuery, CreateFileRequest,
    CreateMessageRequest, CreateOrganizationRequest, CreateProjectRequest, Message, OrgRole,
    OrganizationMember, Project, RegisterUserRequest, TranslationFile, TranslationVersion, User,
};
use lingua_core::{AccessPolicy, Role, RoleHierarchy};
use lingua_db::{AuditStore, FileStore, MemoryStore, Store, VersionStore};
use lingua_services::{ServiceContext, Services};
use std::sync::Arc;
use uuid::Uuid;

pub struct TestWorld {
    pub store: MemoryStore,
    pub services: Services,
}

/// World with the default five-tier policy
pub fn world() -> TestWorld {
    world_with(AccessPolicy::default(), false)
}

pub fn world_with(policy: AccessPolicy, update_resets_status: bool) -> TestWorld {
    let store = MemoryStore::new();
    let ctx = ServiceContext::new(Arc::new(store.clone()), policy)
        .with_update_resets_status(update_resets_status);
    TestWorld {
        store,
        services: Services::new(ctx),
    }
}

/// VIEWER < TRANSLATOR < REVIEWER < LEAD, where LEAD is the top tier
pub fn four_tier_policy() -> AccessPolicy {
    let hierarchy = RoleHierarchy::new(["VIEWER", "TRANSLATOR", "REVIEWER", "LEAD"])
        .expect("valid tiers");
    AccessPolicy::new(
        hierarchy,
        Role::new("TRANSLATOR"),
        Role::new("REVIEWER"),
        Role::new("LEAD"),
    )
    .expect("valid thresholds")
}

impl TestWorld {
    pub async fn user(&self, name: &str) -> User {
        self.services
            .users
            .register(RegisterUserRequest {
                email: format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4()),
                name: name.to_string(),
            })
            .await
            .expect("register user")
    }

    /// Organization plus project owned by `owner`, source language "en"
    pub async fn project(&self, owner: &User, targets: &[&str]) -> Project {
        let organization = self
            .services
            .organizations
            .create(
                owner.id,
                CreateOrganizationRequest {
                    name: "Acme".to_string(),
                    description: None,
                },
            )
            .await
            .expect("create organization");
        self.services
            .projects
            .create(
                owner.id,
                organization.id,
                CreateProjectRequest {
                    name: "Website".to_string(),
                    description: Some("Marketing site".to_string()),
                    source_language: "en".to_string(),
                    target_languages: targets.iter().map(|t| t.to_string()).collect(),
                },
            )
            .await
            .expect("create project")
    }

    /// Registers a user and adds them to the project with `role`
    pub async fn member(&self, owner: &User, project: &Project, name: &str, role: &str) -> User {
        let user = self.user(name).await;
        self.services
            .members
            .add(
                owner.id,
                project.id,
                AddMemberRequest {
                    user_id: user.id,
                    role: role.to_string(),
                },
            )
            .await
            .expect("add member");
        user
    }

    /// Adds an existing user to the organization with `role`
    pub async fn org_member(
        &self,
        admin: &User,
        organization_id: Uuid,
        user: &User,
        role: OrgRole,
    ) -> OrganizationMember {
        self.services
            .organization_members
            .add(
                admin.id,
                organization_id,
                AddOrganizationMemberRequest {
                    user_id: user.id,
                    role,
                },
            )
            .await
            .expect("add organization member")
    }

    pub async fn file(&self, actor: &User, project: &Project, code: &str) -> TranslationFile {
        self.services
            .files
            .create(
                actor.id,
                project.id,
                CreateFileRequest {
                    language_code: code.to_string(),
                    language_name: format!("Language {}", code),
                },
            )
            .await
            .expect("create file")
    }

    pub async fn message(
        &self,
        actor: &User,
        file: &TranslationFile,
        key: &str,
        value: Option<&str>,
    ) -> Message {
        self.services
            .messages
            .create(
                actor.id,
                file.id,
                CreateMessageRequest {
                    key: key.to_string(),
                    value: value.map(str::to_string),
                    comment: None,
                },
            )
            .await
            .expect("create message")
    }

    /// Every audit row of the project, newest first, read straight from the store
    pub async fn audit_rows(&self, project_id: Uuid) -> Vec<AuditLog> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.list_audit(project_id, &AuditQuery::default())
            .await
            .expect("list audit")
    }

    pub async fn stored_file(&self, file_id: Uuid) -> Option<TranslationFile> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.get_file(file_id).await.expect("get file")
    }

    pub async fn stored_versions(&self, file_id: Uuid) -> Vec<TranslationVersion> {
        let mut tx = self.store.begin().await.expect("begin");
        tx.list_versions(file_id).await.expect("list versions")
    }
}
