//! Lingua Services Layer
//!
//! Business services of the translation workspace. Every operation takes the acting
//! user's id, opens one storage transaction, re-resolves the actor's role in the project
//! that owns the target, authorizes against the configured tier, performs its writes
//! together with their audit entries, and commits them as a unit.
//!
//! The message update path is the atomic workflow: message change, message audit entry,
//! file version increment, version snapshot and version audit entry all commit together
//! or not at all.

pub mod access;
pub mod audit;
pub mod context;
pub mod services;
mod snapshot;

pub use access::{require, require_org, resolve_role};
pub use audit::AuditRecorder;
pub use context::ServiceContext;
pub use services::{
    FileService, MemberService, MessageService, OrganizationMemberService, OrganizationService,
    ProjectService, Services, UserService,
};
