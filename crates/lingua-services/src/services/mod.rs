//! Business services
//!
//! Each service is a thin handle over the shared `ServiceContext`; cloning one is cheap.

mod file;
mod member;
mod message;
mod organization;
mod organization_member;
mod project;
mod user;

pub use file::FileService;
pub use member::MemberService;
pub use message::MessageService;
pub use organization::OrganizationService;
pub use organization_member::OrganizationMemberService;
pub use project::ProjectService;
pub use user::UserService;

use crate::audit::AuditRecorder;
use crate::context::ServiceContext;

/// Every service built over one context
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub organizations: OrganizationService,
    pub organization_members: OrganizationMemberService,
    pub projects: ProjectService,
    pub members: MemberService,
    pub files: FileService,
    pub messages: MessageService,
    pub audit: AuditRecorder,
}

impl Services {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            users: UserService::new(ctx.clone()),
            organizations: OrganizationService::new(ctx.clone()),
            organization_members: OrganizationMemberService::new(ctx.clone()),
            projects: ProjectService::new(ctx.clone()),
            members: MemberService::new(ctx.clone()),
            files: FileService::new(ctx.clone()),
            messages: MessageService::new(ctx.clone()),
            audit: AuditRecorder::new(ctx),
        }
    }
}
