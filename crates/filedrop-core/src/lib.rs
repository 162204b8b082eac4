//! Filedrop Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all Filedrop components.

pub mod config;
pub mod error;
pub mod ids;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use ids::generate_file_id;
pub use models::{
    CompressionAlgorithm, FileCategory, FileDescriptor, FileRecord, FileSummary, StorageKind,
    StorageLocation, UserPrefs,
};
