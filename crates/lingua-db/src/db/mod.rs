//! Database layer
//!
//! `store` defines the transactional storage contract the services are written against.
//! `postgres` implements it on a `sqlx` pool, `memory` implements it on an in-process
//! working copy. Every service operation opens one transaction, performs its reads and
//! writes through it, then commits or rolls back as a unit.
//
// Storage contract
pub mod store;
//
// Backends
pub mod memory;
pub mod postgres;
//
// Transaction utilities
pub mod transaction;

pub use memory::{FailPoint, MemoryStore};
pub use postgres::{PgStore, MIGRATOR};
pub use store::{
    AuditStore, FileStore, MemberStore, MessageStore, OrganizationMemberStore, OrganizationStore,
    ProjectStore, Store, StoreTx, UserStore, VersionStore,
};
pub use transaction::commit_or_rollback;
