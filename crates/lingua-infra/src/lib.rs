//! Lingua Infrastructure
//!
//! Process-level bootstrap shared by every binary and test harness: the tracing
//! subscriber and the PostgreSQL pool with its migrations.

pub mod database;
pub mod telemetry;

pub use database::{connect, run_migrations, setup_store};
pub use telemetry::init_tracing;
