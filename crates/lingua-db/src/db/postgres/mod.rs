//! PostgreSQL backend
//!
//! `PgStore` wraps the pool; every `begin` opens a `sqlx` transaction at the default
//! READ COMMITTED level. Contended rows are protected with `SELECT ... FOR UPDATE` and the
//! version counter with a single `UPDATE ... RETURNING`, so two writers to the same file
//! serialize on the file row instead of racing on a stale read.

mod audit;
mod files;
mod members;
mod messages;
mod org_members;
mod organizations;
mod projects;
mod users;
mod versions;

use async_trait::async_trait;
use lingua_core::AppError;
use sqlx::migrate::Migrator;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{Store, StoreTx};

/// Schema migrations embedded from the workspace `migrations/` directory
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Storage backend on a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip(self), fields(db.operation = "begin"))]
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgStoreTx { tx }))
    }
}

/// Open transaction on a pooled connection
pub struct PgStoreTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgStoreTx {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
