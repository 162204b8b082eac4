//! Domain models shared across Filedrop components.

mod algorithm;
mod descriptor;
mod kind;
mod location;
mod record;

pub use algorithm::CompressionAlgorithm;
pub use descriptor::{FileCategory, FileDescriptor, UserPrefs};
pub use kind::StorageKind;
pub use location::StorageLocation;
pub use record::{FileRecord, FileSummary};
