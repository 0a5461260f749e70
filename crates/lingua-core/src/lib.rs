//! Lingua Core Library
//!
//! This crate provides the domain models, request DTOs, role model, error types and
//! configuration shared by every Lingua component.

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod roles;

// Re-export commonly used types
pub use clock::{Clock, SystemClock};
pub use config::{Config, LogFormat};
pub use error::{AppError, ErrorKind, ErrorMetadata, LogLevel};
pub use roles::{AccessLevel, AccessPolicy, Role, RoleHierarchy};
