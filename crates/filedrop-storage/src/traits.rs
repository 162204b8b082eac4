//! Backend capability contracts
//!
//! The orchestrator talks to remote backends exclusively through these
//! traits. Every failure they can produce is recoverable for the caller;
//! whether a failure aborts the request is the orchestrator's decision, not
//! the backend's.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use thiserror::Error;

/// Remote backend operation errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Remote object not found: {0}")]
    NotFound(String),

    #[error("Backend rejected the request: {0}")]
    Rejected(String),

    #[error("Backend call timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Reference to an object stored in the channel backend.
///
/// Serialized as `{channel_id}:{message_id}` when embedded in a storage
/// location's locator field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub channel_id: i64,
    pub message_id: i64,
    /// User-facing link to the stored message.
    pub public_url: String,
}

impl ChannelRef {
    /// The locator form persisted in a `StorageLocation`.
    pub fn locator(&self) -> String {
        format!("{}:{}", self.channel_id, self.message_id)
    }
}

impl Display for ChannelRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.channel_id, self.message_id)
    }
}

impl FromStr for ChannelRef {
    type Err = BackendError;

    /// Parse a persisted locator. The public URL is not part of the locator;
    /// it is reconstructed empty and callers use the record's stored URL.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, message) = s
            .split_once(':')
            .ok_or_else(|| BackendError::Rejected(format!("Malformed channel locator: {}", s)))?;
        let channel_id = channel
            .parse::<i64>()
            .map_err(|_| BackendError::Rejected(format!("Malformed channel id in: {}", s)))?;
        let message_id = message
            .parse::<i64>()
            .map_err(|_| BackendError::Rejected(format!("Malformed message id in: {}", s)))?;
        Ok(ChannelRef {
            channel_id,
            message_id,
            public_url: String::new(),
        })
    }
}

/// Message-oriented object storage addressed by channel + message id.
///
/// Objects may be removed out-of-band at any time; callers must treat every
/// failure as non-fatal.
#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Upload a file as a channel message and return its reference.
    async fn upload(&self, path: &Path, caption: &str) -> BackendResult<ChannelRef>;

    /// Fetch the object behind a reference into `dest`.
    async fn fetch(&self, reference: &ChannelRef, dest: &Path) -> BackendResult<()>;

    /// Delete the object behind a reference.
    async fn delete(&self, reference: &ChannelRef) -> BackendResult<()>;
}

/// Account-based object storage addressed by a public link.
///
/// Used for redundancy only: the core never reads it back, so the contract
/// is upload-only. Reading the returned URL is a manual operation.
#[async_trait]
pub trait CloudStore: Send + Sync {
    /// Upload a file under the given name and return its public URL.
    async fn upload(&self, path: &Path, name: &str) -> BackendResult<String>;
}
