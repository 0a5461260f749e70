//! In-memory backend
//!
//! A transaction takes the store's lock for its whole lifetime and works on a copy of
//! every table. `commit` writes the copy back; `rollback` or dropping the handle throws
//! it away. Transactions are therefore serializable: a second `begin` waits until the
//! first one finishes.
//!
//! Constraint behavior follows the PostgreSQL schema (unique keys, foreign keys,
//! cascades and `SET NULL` on user deletion) so services see the same errors from both
//! backends. `MemoryStore::fail_after` injects storage failures at chosen steps.

mod repos;

use async_trait::async_trait;
use lingua_core::models::{
    AuditLog, Message, Organization, OrganizationMember, Project, ProjectMember,
    TranslationFile, TranslationVersion, User,
};
use lingua_core::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use super::store::{Store, StoreTx};

/// Storage step at which a failure can be injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Begin,
    InsertMessage,
    SaveMessage,
    InsertAudit,
    BumpFileVersion,
    InsertVersion,
    Commit,
}

/// Every table, rows kept in insertion order
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    pub(crate) users: Vec<User>,
    pub(crate) organizations: Vec<Organization>,
    pub(crate) org_members: Vec<OrganizationMember>,
    pub(crate) projects: Vec<Project>,
    pub(crate) members: Vec<ProjectMember>,
    pub(crate) files: Vec<TranslationFile>,
    pub(crate) messages: Vec<Message>,
    pub(crate) versions: Vec<TranslationVersion>,
    pub(crate) audit_logs: Vec<AuditLog>,
}

type FaultTable = Arc<Mutex<HashMap<FailPoint, usize>>>;

/// Transactional in-process store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<AsyncMutex<MemoryState>>,
    faults: FaultTable,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the next `successes` hits of `point` succeed, then fail every later hit with
    /// `AppError::StorageUnavailable` until `clear_failures` is called.
    pub fn fail_after(&self, point: FailPoint, successes: usize) {
        lock_faults(&self.faults).insert(point, successes);
    }

    pub fn clear_failures(&self) {
        lock_faults(&self.faults).clear();
    }
}

fn lock_faults(faults: &FaultTable) -> std::sync::MutexGuard<'_, HashMap<FailPoint, usize>> {
    // A panicking test thread must not poison fault injection for the rest of the suite
    faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn check_fault(faults: &FaultTable, point: FailPoint) -> Result<(), AppError> {
    let mut table = lock_faults(faults);
    match table.get_mut(&point) {
        Some(0) => {
            tracing::debug!(?point, "Injected storage failure");
            Err(AppError::StorageUnavailable(sqlx::Error::Protocol(format!(
                "injected failure at {:?}",
                point
            ))))
        }
        Some(remaining) => {
            *remaining -= 1;
            Ok(())
        }
        None => Ok(()),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        check_fault(&self.faults, FailPoint::Begin)?;
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryStoreTx {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }
}

/// Open transaction over a private copy of the tables
pub struct MemoryStoreTx {
    guard: OwnedMutexGuard<MemoryState>,
    pub(crate) working: MemoryState,
    faults: FaultTable,
}

impl MemoryStoreTx {
    pub(crate) fn check(&self, point: FailPoint) -> Result<(), AppError> {
        check_fault(&self.faults, point)
    }
}

#[async_trait]
impl StoreTx for MemoryStoreTx {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryStoreTx {
            mut guard,
            working,
            faults,
        } = *self;
        check_fault(&faults, FailPoint::Commit)?;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        Ok(())
    }
}
