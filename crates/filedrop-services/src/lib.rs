//! Filedrop Services Library
//!
//! The storage orchestrator: compression, multi-backend upload with
//! fallback, metadata recording, download with fallback, and deletion.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{Download, StorageOrchestrator};
pub use progress::{ProgressSink, ProgressStage};
