//! Storage location model: backend-agnostic reference to where a file copy lives.

use serde::{Deserialize, Serialize};

use super::kind::StorageKind;

/// A reference to one physical copy of a stored file.
///
/// The locator is opaque to everything except the backend that issued it:
/// `channel_id:message_id` for the channel backend, a public URL for the
/// cloud backend, a filesystem path for the local vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageLocation {
    pub kind: StorageKind,
    pub locator: String,
    /// User-facing reference, when the backend issues one distinct from the
    /// locator (the channel backend's t.me-style link). Local copies use the
    /// path itself.
    pub public_url: Option<String>,
}

impl StorageLocation {
    pub fn new(kind: StorageKind, locator: impl Into<String>) -> Self {
        StorageLocation {
            kind,
            locator: locator.into(),
            public_url: None,
        }
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    /// The reference handed back to users: the public URL when the backend
    /// issued one, the raw locator otherwise.
    pub fn public_reference(&self) -> &str {
        self.public_url.as_deref().unwrap_or(&self.locator)
    }
}
