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

use super::{FailPoint, MemoryState, MemoryStoreTx};
use crate::db::store::{
    AuditStore, FileStore, MemberStore, MessageStore, OrganizationMemberStore,
    OrganizationStore, ProjectStore, UserStore, VersionStore,
};

fn unique_violation(constraint: &str) -> AppError {
    AppError::Conflict(format!("unique constraint {} violated", constraint))
}

fn missing_reference(constraint: &str) -> AppError {
    AppError::NotFound(format!("referenced row missing ({})", constraint))
}

impl MemoryState {
    fn require_user(&self, id: Uuid, constraint: &str) -> Result<(), AppError> {
        if self.users.iter().any(|u| u.id == id) {
            Ok(())
        } else {
            Err(missing_reference(constraint))
        }
    }

    fn remove_file_rows(&mut self, file_ids: &[Uuid]) {
        self.messages.retain(|m| !file_ids.contains(&m.file_id));
        self.versions.retain(|v| !file_ids.contains(&v.file_id));
        self.files.retain(|f| !file_ids.contains(&f.id));
    }

    fn remove_project_rows(&mut self, project_ids: &[Uuid]) {
        let file_ids: Vec<Uuid> = self
            .files
            .iter()
            .filter(|f| project_ids.contains(&f.project_id))
            .map(|f| f.id)
            .collect();
        self.remove_file_rows(&file_ids);
        self.members.retain(|m| !project_ids.contains(&m.project_id));
        self.audit_logs
            .retain(|a| !project_ids.contains(&a.project_id));
        self.projects.retain(|p| !project_ids.contains(&p.id));
    }
}

#[async_trait]
impl UserStore for MemoryStoreTx {
    async fn insert_user(&mut self, user: NewUser) -> Result<User, AppError> {
        let state = &mut self.working;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(unique_violation("users_email_key"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&mut self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.working.users.iter().find(|u| u.id == id).cloned())
    }

    async fn delete_user(&mut self, id: Uuid) -> Result<bool, AppError> {
        let state = &mut self.working;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Ok(false);
        }

        let clear = |field: &mut Option<Uuid>| {
            if *field == Some(id) {
                *field = None;
            }
        };
        state
            .organizations
            .iter_mut()
            .for_each(|o| clear(&mut o.created_by));
        state
            .projects
            .iter_mut()
            .for_each(|p| clear(&mut p.created_by));
        state.files.iter_mut().for_each(|f| clear(&mut f.created_by));
        for message in state.messages.iter_mut() {
            clear(&mut message.created_by);
            clear(&mut message.reviewed_by);
        }
        state
            .versions
            .iter_mut()
            .for_each(|v| clear(&mut v.created_by));
        state
            .audit_logs
            .iter_mut()
            .for_each(|a| clear(&mut a.user_id));
        state.members.retain(|m| m.user_id != id);
        state.org_members.retain(|m| m.user_id != id);
        Ok(true)
    }

    async fn memberships_of_user(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<ProjectMember>, AppError> {
        Ok(self
            .working
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrganizationStore for MemoryStoreTx {
    async fn insert_organization(
        &mut self,
        organization: NewOrganization,
    ) -> Result<Organization, AppError> {
        let state = &mut self.working;
        state.require_user(organization.created_by, "organizations_created_by_fkey")?;
        let organization = Organization {
            id: Uuid::new_v4(),
            name: organization.name,
            description: organization.description,
            created_by: Some(organization.created_by),
            created_at: organization.created_at,
            updated_at: None,
        };
        state.organizations.push(organization.clone());
        Ok(organization)
    }

    async fn get_organization(&mut self, id: Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self
            .working
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn find_organization_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<Organization>, AppError> {
        let name = name.to_lowercase();
        Ok(self
            .working
            .organizations
            .iter()
            .filter(|o| o.name.to_lowercase() == name)
            .min_by_key(|o| o.created_at)
            .cloned())
    }

    async fn list_organizations_by_creator(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<Organization>, AppError> {
        Ok(self
            .working
            .organizations
            .iter()
            .filter(|o| o.created_by == Some(user_id))
            .cloned()
            .collect())
    }

    async fn update_organization(
        &mut self,
        id: Uuid,
        changes: OrganizationChanges,
    ) -> Result<Option<Organization>, AppError> {
        let Some(organization) = self.working.organizations.iter_mut().find(|o| o.id == id)
        else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            organization.name = name;
        }
        if let Some(description) = changes.description {
            organization.description = Some(description);
        }
        organization.updated_at = Some(changes.updated_at);
        Ok(Some(organization.clone()))
    }

    async fn delete_organization(&mut self, id: Uuid) -> Result<bool, AppError> {
        let state = &mut self.working;
        if !state.organizations.iter().any(|o| o.id == id) {
            return Ok(false);
        }
        let project_ids: Vec<Uuid> = state
            .projects
            .iter()
            .filter(|p| p.organization_id == id)
            .map(|p| p.id)
            .collect();
        state.remove_project_rows(&project_ids);
        state.org_members.retain(|m| m.organization_id != id);
        state.organizations.retain(|o| o.id != id);
        Ok(true)
    }
}

#[async_trait]
impl OrganizationMemberStore for MemoryStoreTx {
    async fn insert_org_member(
        &mut self,
        member: NewOrganizationMember,
    ) -> Result<OrganizationMember, AppError> {
        let state = &mut self.working;
        if !state
            .organizations
            .iter()
            .any(|o| o.id == member.organization_id)
        {
            return Err(missing_reference(
                "organization_members_organization_id_fkey",
            ));
        }
        state.require_user(member.user_id, "organization_members_user_id_fkey")?;
        if state
            .org_members
            .iter()
            .any(|m| m.organization_id == member.organization_id && m.user_id == member.user_id)
        {
            return Err(unique_violation("uq_organization_members_organization_user"));
        }
        let member = OrganizationMember {
            id: Uuid::new_v4(),
            organization_id: member.organization_id,
            user_id: member.user_id,
            role: member.role,
            created_at: member.created_at,
            updated_at: None,
        };
        state.org_members.push(member.clone());
        Ok(member)
    }

    async fn find_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<OrganizationMember>, AppError> {
        Ok(self
            .working
            .org_members
            .iter()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_org_members(
        &mut self,
        query: &OrganizationMemberQuery,
    ) -> Result<Vec<OrganizationMember>, AppError> {
        Ok(self
            .working
            .org_members
            .iter()
            .filter(|m| query.matches(m))
            .cloned()
            .collect())
    }

    // The whole store is already held exclusively by this transaction
    async fn lock_org_members(
        &mut self,
        organization_id: Uuid,
    ) -> Result<Vec<OrganizationMember>, AppError> {
        let query = OrganizationMemberQuery {
            organization_id: Some(organization_id),
            ..Default::default()
        };
        self.list_org_members(&query).await
    }

    async fn update_org_member_role(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<OrganizationMember>, AppError> {
        let Some(member) = self
            .working
            .org_members
            .iter_mut()
            .find(|m| m.organization_id == organization_id && m.user_id == user_id)
        else {
            return Ok(None);
        };
        member.role = role;
        member.updated_at = Some(updated_at);
        Ok(Some(member.clone()))
    }

    async fn delete_org_member(
        &mut self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let members = &mut self.working.org_members;
        let before = members.len();
        members.retain(|m| !(m.organization_id == organization_id && m.user_id == user_id));
        Ok(members.len() < before)
    }

    async fn delete_org_members_by_user(&mut self, user_id: Uuid) -> Result<u64, AppError> {
        let members = &mut self.working.org_members;
        let before = members.len();
        members.retain(|m| m.user_id != user_id);
        Ok((before - members.len()) as u64)
    }
}

#[async_trait]
impl ProjectStore for MemoryStoreTx {
    async fn insert_project(&mut self, project: NewProject) -> Result<Project, AppError> {
        let state = &mut self.working;
        if !state
            .organizations
            .iter()
            .any(|o| o.id == project.organization_id)
        {
            return Err(missing_reference("projects_organization_id_fkey"));
        }
        state.require_user(project.created_by, "projects_created_by_fkey")?;
        if state
            .projects
            .iter()
            .any(|p| p.organization_id == project.organization_id && p.name == project.name)
        {
            return Err(unique_violation("uq_projects_organization_name"));
        }
        let project = Project {
            id: Uuid::new_v4(),
            organization_id: project.organization_id,
            name: project.name,
            description: project.description,
            source_language: project.source_language,
            target_languages: project.target_languages,
            created_by: Some(project.created_by),
            created_at: project.created_at,
            updated_at: None,
        };
        state.projects.push(project.clone());
        Ok(project)
    }

    async fn get_project(&mut self, id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.working.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_project_by_name(
        &mut self,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Option<Project>, AppError> {
        Ok(self
            .working
            .projects
            .iter()
            .find(|p| p.organization_id == organization_id && p.name == name)
            .cloned())
    }

    async fn list_projects(&mut self, organization_id: Uuid) -> Result<Vec<Project>, AppError> {
        Ok(self
            .working
            .projects
            .iter()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect())
    }

    async fn list_projects_for_user(&mut self, user_id: Uuid) -> Result<Vec<Project>, AppError> {
        let state = &self.working;
        Ok(state
            .projects
            .iter()
            .filter(|p| {
                state
                    .members
                    .iter()
                    .any(|m| m.project_id == p.id && m.user_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn update_project(
        &mut self,
        id: Uuid,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, AppError> {
        let state = &mut self.working;
        let Some(index) = state.projects.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(ref name) = changes.name {
            let organization_id = state.projects[index].organization_id;
            if state
                .projects
                .iter()
                .any(|p| p.id != id && p.organization_id == organization_id && &p.name == name)
            {
                return Err(unique_violation("uq_projects_organization_name"));
            }
        }
        let project = &mut state.projects[index];
        if let Some(name) = changes.name {
            project.name = name;
        }
        if let Some(description) = changes.description {
            project.description = Some(description);
        }
        if let Some(source_language) = changes.source_language {
            project.source_language = source_language;
        }
        if let Some(target_languages) = changes.target_languages {
            project.target_languages = target_languages;
        }
        project.updated_at = Some(changes.updated_at);
        Ok(Some(project.clone()))
    }

    async fn delete_project(&mut self, id: Uuid) -> Result<bool, AppError> {
        let state = &mut self.working;
        if !state.projects.iter().any(|p| p.id == id) {
            return Ok(false);
        }
        state.remove_project_rows(&[id]);
        Ok(true)
    }

    async fn project_stats(&mut self, id: Uuid) -> Result<Option<ProjectStats>, AppError> {
        let state = &self.working;
        let Some(project) = state.projects.iter().find(|p| p.id == id) else {
            return Ok(None);
        };
        let file_ids: Vec<Uuid> = state
            .files
            .iter()
            .filter(|f| f.project_id == id)
            .map(|f| f.id)
            .collect();
        let total_messages = state
            .messages
            .iter()
            .filter(|m| file_ids.contains(&m.file_id))
            .count();
        let members = state.members.iter().filter(|m| m.project_id == id).count();
        Ok(Some(ProjectStats {
            project_id: id,
            name: project.name.clone(),
            files: file_ids.len() as i64,
            total_messages: total_messages as i64,
            members: members as i64,
        }))
    }
}

#[async_trait]
impl MemberStore for MemoryStoreTx {
    async fn insert_member(
        &mut self,
        member: NewProjectMember,
    ) -> Result<ProjectMember, AppError> {
        let state = &mut self.working;
        if !state.projects.iter().any(|p| p.id == member.project_id) {
            return Err(missing_reference("project_members_project_id_fkey"));
        }
        state.require_user(member.user_id, "project_members_user_id_fkey")?;
        if state
            .members
            .iter()
            .any(|m| m.project_id == member.project_id && m.user_id == member.user_id)
        {
            return Err(unique_violation("uq_project_members_project_user"));
        }
        let member = ProjectMember {
            id: Uuid::new_v4(),
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role,
            created_at: member.created_at,
            updated_at: None,
        };
        state.members.push(member.clone());
        Ok(member)
    }

    async fn find_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ProjectMember>, AppError> {
        Ok(self
            .working
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn list_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        Ok(self
            .working
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect())
    }

    // The whole store is already held exclusively by this transaction
    async fn lock_members(&mut self, project_id: Uuid) -> Result<Vec<ProjectMember>, AppError> {
        self.list_members(project_id).await
    }

    async fn update_member_role(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
        role: &Role,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<ProjectMember>, AppError> {
        let Some(member) = self
            .working
            .members
            .iter_mut()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
        else {
            return Ok(None);
        };
        member.role = role.clone();
        member.updated_at = Some(updated_at);
        Ok(Some(member.clone()))
    }

    async fn delete_member(
        &mut self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, AppError> {
        let members = &mut self.working.members;
        let before = members.len();
        members.retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(members.len() < before)
    }
}

#[async_trait]
impl FileStore for MemoryStoreTx {
    async fn insert_file(
        &mut self,
        file: NewTranslationFile,
    ) -> Result<TranslationFile, AppError> {
        let state = &mut self.working;
        if !state.projects.iter().any(|p| p.id == file.project_id) {
            return Err(missing_reference("translation_files_project_id_fkey"));
        }
        state.require_user(file.created_by, "translation_files_created_by_fkey")?;
        if state
            .files
            .iter()
            .any(|f| f.project_id == file.project_id && f.language_code == file.language_code)
        {
            return Err(unique_violation("uq_translation_files_project_language"));
        }
        let file = TranslationFile {
            id: Uuid::new_v4(),
            project_id: file.project_id,
            language_code: file.language_code,
            language_name: file.language_name,
            current_version: 0,
            created_by: Some(file.created_by),
            created_at: file.created_at,
            updated_at: None,
        };
        state.files.push(file.clone());
        Ok(file)
    }

    async fn get_file(&mut self, id: Uuid) -> Result<Option<TranslationFile>, AppError> {
        Ok(self.working.files.iter().find(|f| f.id == id).cloned())
    }

    async fn find_file_by_language(
        &mut self,
        project_id: Uuid,
        language_code: &str,
    ) -> Result<Option<TranslationFile>, AppError> {
        Ok(self
            .working
            .files
            .iter()
            .find(|f| f.project_id == project_id && f.language_code == language_code)
            .cloned())
    }

    async fn list_files(&mut self, project_id: Uuid) -> Result<Vec<TranslationFile>, AppError> {
        Ok(self
            .working
            .files
            .iter()
            .filter(|f| f.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_file(
        &mut self,
        id: Uuid,
        language_name: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<TranslationFile>, AppError> {
        let Some(file) = self.working.files.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };
        file.language_name = language_name.to_string();
        file.updated_at = Some(updated_at);
        Ok(Some(file.clone()))
    }

    async fn bump_file_version(
        &mut self,
        id: Uuid,
        updated_at: DateTime<Utc>,
    ) -> Result<i32, AppError> {
        self.check(FailPoint::BumpFileVersion)?;
        let Some(file) = self.working.files.iter_mut().find(|f| f.id == id) else {
            return Err(AppError::not_found("Translation file", id));
        };
        file.current_version += 1;
        file.updated_at = Some(updated_at);
        Ok(file.current_version)
    }

    async fn delete_file(&mut self, id: Uuid) -> Result<bool, AppError> {
        let state = &mut self.working;
        if !state.files.iter().any(|f| f.id == id) {
            return Ok(false);
        }
        state.remove_file_rows(&[id]);
        Ok(true)
    }
}

#[async_trait]
impl MessageStore for MemoryStoreTx {
    async fn insert_message(&mut self, message: NewMessage) -> Result<Message, AppError> {
        self.check(FailPoint::InsertMessage)?;
        let state = &mut self.working;
        if !state.files.iter().any(|f| f.id == message.file_id) {
            return Err(missing_reference("messages_file_id_fkey"));
        }
        state.require_user(message.created_by, "messages_created_by_fkey")?;
        if state
            .messages
            .iter()
            .any(|m| m.file_id == message.file_id && m.key == message.key)
        {
            return Err(unique_violation("uq_messages_file_key"));
        }
        let message = Message {
            id: Uuid::new_v4(),
            file_id: message.file_id,
            key: message.key,
            value: message.value,
            comment: message.comment,
            status: MessageStatus::Pending,
            created_by: Some(message.created_by),
            reviewed_by: None,
            created_at: message.created_at,
            updated_at: None,
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError> {
        Ok(self.working.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn lock_message(&mut self, id: Uuid) -> Result<Option<Message>, AppError> {
        self.get_message(id).await
    }

    async fn find_message_by_key(
        &mut self,
        file_id: Uuid,
        key: &str,
    ) -> Result<Option<Message>, AppError> {
        Ok(self
            .working
            .messages
            .iter()
            .find(|m| m.file_id == file_id && m.key == key)
            .cloned())
    }

    async fn list_messages(
        &mut self,
        file_id: Uuid,
        status: Option<MessageStatus>,
    ) -> Result<Vec<Message>, AppError> {
        Ok(self
            .working
            .messages
            .iter()
            .filter(|m| m.file_id == file_id && status.map_or(true, |s| m.status == s))
            .cloned()
            .collect())
    }

    async fn save_message(&mut self, message: &Message) -> Result<Message, AppError> {
        self.check(FailPoint::SaveMessage)?;
        if let Some(reviewer) = message.reviewed_by {
            self.working
                .require_user(reviewer, "messages_reviewed_by_fkey")?;
        }
        let Some(stored) = self
            .working
            .messages
            .iter_mut()
            .find(|m| m.id == message.id)
        else {
            return Err(AppError::not_found("Message", message.id));
        };
        stored.value = message.value.clone();
        stored.comment = message.comment.clone();
        stored.status = message.status;
        stored.reviewed_by = message.reviewed_by;
        stored.updated_at = message.updated_at;
        Ok(stored.clone())
    }

    async fn delete_message(&mut self, id: Uuid) -> Result<bool, AppError> {
        let messages = &mut self.working.messages;
        let before = messages.len();
        messages.retain(|m| m.id != id);
        Ok(messages.len() < before)
    }
}

#[async_trait]
impl VersionStore for MemoryStoreTx {
    async fn insert_version(
        &mut self,
        version: NewTranslationVersion,
    ) -> Result<TranslationVersion, AppError> {
        self.check(FailPoint::InsertVersion)?;
        let state = &mut self.working;
        if !state.files.iter().any(|f| f.id == version.file_id) {
            return Err(missing_reference("translation_versions_file_id_fkey"));
        }
        state.require_user(version.created_by, "translation_versions_created_by_fkey")?;
        if state
            .versions
            .iter()
            .any(|v| v.file_id == version.file_id && v.version_number == version.version_number)
        {
            return Err(unique_violation("uq_translation_versions_file_number"));
        }
        let version = TranslationVersion {
            id: Uuid::new_v4(),
            file_id: version.file_id,
            version_number: version.version_number,
            snapshot: version.snapshot,
            created_by: Some(version.created_by),
            created_at: version.created_at,
        };
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn list_versions(
        &mut self,
        file_id: Uuid,
    ) -> Result<Vec<TranslationVersion>, AppError> {
        let mut versions: Vec<TranslationVersion> = self
            .working
            .versions
            .iter()
            .filter(|v| v.file_id == file_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version_number);
        Ok(versions)
    }

    async fn get_version(
        &mut self,
        file_id: Uuid,
        version_number: i32,
    ) -> Result<Option<TranslationVersion>, AppError> {
        Ok(self
            .working
            .versions
            .iter()
            .find(|v| v.file_id == file_id && v.version_number == version_number)
            .cloned())
    }
}

#[async_trait]
impl AuditStore for MemoryStoreTx {
    async fn insert_audit(&mut self, entry: NewAuditEntry) -> Result<AuditLog, AppError> {
        self.check(FailPoint::InsertAudit)?;
        let state = &mut self.working;
        if !state.projects.iter().any(|p| p.id == entry.project_id) {
            return Err(missing_reference("audit_logs_project_id_fkey"));
        }
        state.require_user(entry.user_id, "audit_logs_user_id_fkey")?;
        let log = AuditLog {
            id: Uuid::new_v4(),
            project_id: entry.project_id,
            user_id: Some(entry.user_id),
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: entry.created_at,
        };
        state.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn list_audit(
        &mut self,
        project_id: Uuid,
        query: &AuditQuery,
    ) -> Result<Vec<AuditLog>, AppError> {
        let limit = query.limit.map_or(usize::MAX, |l| l.clamp(1, 1000) as usize);
        Ok(self
            .working
            .audit_logs
            .iter()
            .rev()
            .filter(|a| a.project_id == project_id)
            .filter(|a| query.entity_id.map_or(true, |id| a.entity_id == id))
            .take(limit)
            .cloned()
            .collect())
    }
}
