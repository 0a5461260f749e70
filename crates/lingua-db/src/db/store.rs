//! Storage contract
//!
//! One sub-trait per entity, all implemented by a transaction handle (`StoreTx`).
//! Methods never commit on their own; the caller commits or rolls back the whole unit.
//! Unique-key violations surface as `AppError::Conflict`, missing referenced rows as
//! `AppError::NotFound`, and backend failures as `AppError::StorageUnavailable`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingua_core::models::{
    AuditLog, AuditQuery, Message, MessageStatus, NewAuditEntry, NewMessage, NewOrganization,
    NewOrganizationMember, NewProject, NewProjectMember, NewTranslationFile,
    NewTranslationVersion, NewUser, OrgRole, Organization, OrganizationChanges,
    OrganizationMember, OrganizationMemberQuery, Project, ProjectChanges, ProjectMember,
    ProjectStats, TranslationFile, TranslationVersion, User,
};
use lingua_core::{AppError, Role};
use uuid::Uuid;

#[async_trait]
pub trait UserStore: Send {
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError>;

    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Nulls every creator, reviewer and actor reference to the user and drops its
    /// project and organization memberships. Returns `false` when no such user exists.
    async fn delete_user(&mut self, id: Uuid) -> Result<bool, AppError>;

    async fn memberships_of_user(&mut self, user_id: Uuid)
        -> Result<Vec<ProjectMember>, AppError>;
}

#[async_trait]
pub trait OrganizationStore: Send {
    async fn insert_organization(
        &mut self,
        organization: NewOrganization,
    ) -> Result<Organization, AppError>;

    async fn get_organization(&mut self, id: Uuid) -> Result<Option<Organization>, AppError>;

    /// Oldest organization whose name matches case-insensitively
    async fn find_organization_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Organization>, AppError>;

    async fn list_organizations_by_creator(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<Organization>, AppError>;

    async fn update_organization(
        &mut self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError>;

    /// Cascades to the organization's memberships and projects
    async fn delete_organization(&mut self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait OrganizationMemberStore: Send {
    async fn insert_org_member(
        &mut self,
        member: NewOrganizationMember,
    ) -> Result<OrganizationMember, AppError>;

    async fn find_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMember>, AppError>;

    /// Memberships matching every set filter, oldest first
    async fn list_org_members(
        &mut self,
        query: &OrganizationMemberQuery,
    ) -> Result<Vec<OrganizationMember>, AppError>;

    /// Lists an organization's members while holding their rows locked until the
    /// transaction ends
    async fn lock_org_members(
        &mut self,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationMember>, AppError>;

    async fn update_org_member_role(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<OrganizationMember>, AppError>;

    async fn delete_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError>;

    /// Removes every organization membership of the user, returning how many went
    async fn delete_org_members_by_user(&mut self, user_id: Uuid) -> Result<u64, AppError>;
}

#[async_trait]
pub trait ProjectStore: Send {
    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError>;

    async fn get_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError>;

    async fn find_project_by_name(
        &mut self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, AppError>;

    async fn list_projects(&mut self, organization_id: Uuid) -> Result<Vec<Project>, AppError>;

    /// Projects the user holds a membership in
    async fn list_projects_for_user(&mut self, user_id: Uuid) -> Result<Vec<Project>, AppError>;

    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, AppError>;

    /// Cascades to members, files, messages, versions and audit entries
    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError>;

    async fn project_stats(&mut self, id: Uuid) -> Result<Option<ProjectStats>, AppError>;
}

#[async_trait]
pub trait MemberStore: Send {
    async fn insert_member(&mut self, member: NewProjectMember)
        -> Result<ProjectMember, AppError>;

    async fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, AppError>;

    async fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError>;

    /// Lists members while holding their rows locked until the transaction ends
    async fn lock_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError>;

    async fn update_member_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
        role: &Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ProjectMember>, AppError>;

    async fn delete_member(&mut self, project_id: Uuid, user_id: Uuid)
        -> Result<bool, AppError>;
}

#[async_trait]
pub trait FileStore: Send {
    async fn insert_file(&mut self, file: NewTranslationFile)
        -> Result<TranslationFile, AppError>;

    async fn get_file(&mut self, id: Uuid) -> Result<Option<TranslationFile>, AppError>;

    async fn find_file_by_language(
        &mut self,
        project_id: Uuid,
        language_code: &str,
    ) -> Result<Option<TranslationFile>, AppError>;

    async fn list_files(&mut self, project_id: Uuid) -> Result<Vec<TranslationFile>, AppError>;

    async fn update_file(
        &mut self,
        id: Uuid,
        language_name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TranslationFile>, AppError>;

    /// Advances `current_version` by exactly one in a single read-modify-write and
    /// returns the new value. The file row stays locked until the transaction ends.
    async fn bump_file_version(
        &mut self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<i32, AppError>;

    /// Cascades to messages and versions
    async fn delete_file(&mut self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait MessageStore: Send {
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError>;

    async fn get_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError>;

    /// Reads the message and locks its row until the transaction ends
    async fn lock_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError>;

    async fn find_message_by_key(
        &mut self,
        file_id: Uuid,
        key: &str,
    ) -> Result<Option<Message>, AppError>;

    /// Messages of a file in creation order
    async fn list_messages(
        &mut self,
        file_id: Uuid,
        status: Option<MessageStatus>,
    ) -> Result<Vec<Message>, AppError>;

    /// Writes value, comment, status, reviewer and `updated_at` of an existing message
    async fn save_message(&mut self, message: &Message) -> Result<Message, AppError>;

    async fn delete_message(&mut self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait VersionStore: Send {
    async fn insert_version(
        &mut self,
        version: NewTranslationVersion,
    ) -> Result<TranslationVersion, AppError>;

    /// Versions of a file, oldest first
    async fn list_versions(&mut self, file_id: Uuid)
        -> Result<Vec<TranslationVersion>, AppError>;

    async fn get_version(
        &mut self,
        file_id: Uuid,
        version_number: i32,
    ) -> Result<Option<TranslationVersion>, AppError>;
}

#[async_trait]
pub trait AuditStore: Send {
    async fn insert_audit(&mut self, entry: NewAuditEntry) -> Result<AuditLog, AppError>;

    /// Entries of a project, newest first
    async fn list_audit(
        &mut self,
        project_id: Uuid,
        query: &AuditQuery,
    ) -> Result<Vec<AuditLog>, AppError>;
}

/// An open transaction. Dropping it without `commit` discards every write.
#[async_trait]
pub trait StoreTx:
    UserStore
    + OrganizationStore
    + OrganizationMemberStore
    + ProjectStore
    + MemberStore
    + FileStore
    + MessageStore
    + VersionStore
    + AuditStore
    + Send
{
    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Entry point of a storage backend
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}
