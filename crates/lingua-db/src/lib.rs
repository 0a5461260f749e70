//! Lingua Entity Store
//!
//! Storage traits for every entity of the translation workspace, a PostgreSQL
//! implementation on `sqlx`, and an in-memory transactional implementation used by tests
//! and local tooling.

pub mod db;

pub use db::{
    commit_or_rollback, AuditStore, FailPoint, FileStore, MemberStore, MemoryStore,
    MessageStore, OrganizationMemberStore, OrganizationStore, PgStore, ProjectStore, Store,
    StoreTx, UserStore, VersionStore, MIGRATOR,
};
