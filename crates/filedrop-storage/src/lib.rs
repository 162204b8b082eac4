//! Filedrop Storage Library
//!
//! Storage backends and the durable metadata index.
//!
//! Three backend kinds exist, in fixed read priority: the channel backend
//! (message-oriented object storage), the cloud backend (redundancy only,
//! never read by the core), and the local vault. The vault is the durability
//! floor: every upload lands there, and its failure is the only storage
//! failure that aborts an upload.

pub mod index;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use index::MetadataIndex;
pub use local::{LocalVault, VaultUsage};
pub use traits::{BackendError, BackendResult, ChannelRef, ChannelStore, CloudStore};
