use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::CompressionAlgorithm;
use super::kind::StorageKind;
use super::location::StorageLocation;

/// Persisted metadata for one uploaded file.
///
/// A record is created exactly once, at the end of a successful upload
/// sequence, and removed wholesale by deletion; no field other than the
/// location set is ever rewritten. Invariants:
///
/// - `locations` holds at least one entry (the local backup copy).
/// - `primary_kind` always references a kind present in `locations`.
/// - Lookups are scoped by `(file_id, owner_id)`; an owner mismatch is
///   indistinguishable from an absent id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_id: String,
    pub owner_id: i64,
    pub original_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub algorithm: CompressionAlgorithm,
    /// Percentage saved: `(1 - compressed/original) * 100`, 0 for empty input.
    pub compression_ratio: f64,
    pub locations: Vec<StorageLocation>,
    pub primary_kind: StorageKind,
    pub created_at: DateTime<Utc>,
}

impl FileRecord {
    /// The location for a given backend kind, if one succeeded at upload time.
    pub fn location(&self, kind: StorageKind) -> Option<&StorageLocation> {
        self.locations.iter().find(|loc| loc.kind == kind)
    }

    /// The preferred read location.
    pub fn primary_location(&self) -> Option<&StorageLocation> {
        self.location(self.primary_kind)
    }

    /// The user-facing reference of the primary location.
    pub fn public_reference(&self) -> Option<&str> {
        self.primary_location().map(|loc| loc.public_reference())
    }

    pub fn summary(&self) -> FileSummary {
        FileSummary {
            file_id: self.file_id.clone(),
            original_name: self.original_name.clone(),
            original_size: self.original_size,
            compressed_size: self.compressed_size,
            compression_ratio: self.compression_ratio,
            created_at: self.created_at,
            public_url: self.public_reference().unwrap_or_default().to_string(),
        }
    }
}

/// Listing projection of a `FileRecord`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSummary {
    pub file_id: String,
    pub original_name: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub created_at: DateTime<Utc>,
    pub public_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_locations(locations: Vec<StorageLocation>, primary: StorageKind) -> FileRecord {
        FileRecord {
            file_id: "f1".into(),
            owner_id: 42,
            original_name: "notes.txt".into(),
            original_size: 1000,
            compressed_size: 400,
            algorithm: CompressionAlgorithm::Gzip,
            compression_ratio: 60.0,
            locations,
            primary_kind: primary,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn primary_location_follows_kind() {
        let record = record_with_locations(
            vec![
                StorageLocation::new(StorageKind::Channel, "-100123:55")
                    .with_public_url("t.me/c/123/55"),
                StorageLocation::new(StorageKind::Local, "/vault/user_42/f1_notes.txt.gz"),
            ],
            StorageKind::Channel,
        );

        assert_eq!(record.primary_location().unwrap().locator, "-100123:55");
        assert_eq!(record.public_reference(), Some("t.me/c/123/55"));
    }

    #[test]
    fn local_reference_is_the_path() {
        let record = record_with_locations(
            vec![StorageLocation::new(
                StorageKind::Local,
                "/vault/user_42/f1_notes.txt.gz",
            )],
            StorageKind::Local,
        );

        assert_eq!(
            record.public_reference(),
            Some("/vault/user_42/f1_notes.txt.gz")
        );
        assert!(record.location(StorageKind::Channel).is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let record = record_with_locations(
            vec![StorageLocation::new(StorageKind::Local, "/vault/x")],
            StorageKind::Local,
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.file_id, record.file_id);
        assert_eq!(back.primary_kind, StorageKind::Local);
        assert_eq!(back.algorithm, CompressionAlgorithm::Gzip);
    }
}
