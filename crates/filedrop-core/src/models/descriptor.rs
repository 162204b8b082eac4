use serde::{Deserialize, Serialize};

use super::algorithm::CompressionAlgorithm;

/// Category of an incoming file, resolved once at the bot boundary before
/// the file enters the storage core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Image,
    Video,
    Audio,
}

/// Descriptor bag accompanying an upload: everything the core needs to know
/// about the original file, fixed at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub original_name: String,
    pub original_size: u64,
    pub content_type: Option<String>,
    pub category: FileCategory,
}

impl FileDescriptor {
    pub fn new(original_name: impl Into<String>, original_size: u64, category: FileCategory) -> Self {
        FileDescriptor {
            original_name: original_name.into(),
            original_size,
            content_type: None,
            category,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Per-session compression preferences. Constructed from config defaults and
/// carried in request context; there is no process-global preference map.
#[derive(Debug, Clone, Copy)]
pub struct UserPrefs {
    pub algorithm: CompressionAlgorithm,
    pub level: u32,
}

impl UserPrefs {
    pub fn new(algorithm: CompressionAlgorithm, level: u32) -> Self {
        UserPrefs { algorithm, level }
    }
}
