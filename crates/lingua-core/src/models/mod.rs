//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents one entity of the translation
//! workspace together with its request DTOs.

mod audit;
mod member;
mod message;
mod organization;
mod organization_member;
mod project;
mod translation_file;
mod user;
mod version;

// Re-export all models for convenient imports
pub use audit::*;
pub use member::*;
pub use message::*;
pub use organization::*;
pub use organization_member::*;
pub use project::*;
pub use translation_file::*;
pub use user::*;
pub use version::*;
