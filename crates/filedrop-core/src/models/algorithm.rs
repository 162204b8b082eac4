use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;

/// Supported compression algorithms.
///
/// Each algorithm maps deterministically to a file-extension suffix; the
/// decompression side detects the algorithm from that suffix alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Zip,
    Gzip,
    Zstd,
}

impl CompressionAlgorithm {
    /// Canonical file extension appended to compressed output.
    pub fn extension(self) -> &'static str {
        match self {
            CompressionAlgorithm::Zip => "zip",
            CompressionAlgorithm::Gzip => "gz",
            CompressionAlgorithm::Zstd => "zst",
        }
    }

    /// Detect the algorithm from a compressed file's extension.
    /// Returns `None` for unrecognized suffixes; callers treat that as a
    /// hard error.
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "zip" => Some(CompressionAlgorithm::Zip),
            "gz" | "gzip" => Some(CompressionAlgorithm::Gzip),
            "zst" | "zstd" => Some(CompressionAlgorithm::Zstd),
            _ => None,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" => Ok(CompressionAlgorithm::Zip),
            "gzip" | "gz" => Ok(CompressionAlgorithm::Gzip),
            "zstd" | "zst" => Ok(CompressionAlgorithm::Zstd),
            _ => Err(anyhow::anyhow!("Invalid compression algorithm: {}", s)),
        }
    }
}

impl Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CompressionAlgorithm::Zip => write!(f, "zip"),
            CompressionAlgorithm::Gzip => write!(f, "gzip"),
            CompressionAlgorithm::Zstd => write!(f, "zstd"),
        }
    }
}
