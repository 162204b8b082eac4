//! Durable metadata index.
//!
//! A `file_id -> FileRecord` map held fully in memory and flushed
//! write-through on every mutation. The flush replaces the durable file
//! atomically (write to a fresh temp file in the same directory, then rename
//! over the previous copy) so a crash can never leave a torn file visible.
//! A crash between the in-memory mutation and the flush loses that mutation,
//! which is acceptable because nothing suspends between the two.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use filedrop_core::{AppError, AppResult, FileRecord};
use tokio::sync::RwLock;

pub struct MetadataIndex {
    path: PathBuf,
    inner: RwLock<HashMap<String, FileRecord>>,
}

impl MetadataIndex {
    /// Load the index from its durable file.
    ///
    /// A missing or unreadable file is an empty index, never fatal: losing
    /// metadata on first run or after corruption beats refusing to start.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, FileRecord>>(&bytes) {
                Ok(map) => {
                    tracing::info!(path = %path.display(), records = map.len(), "Metadata index loaded");
                    map
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Unreadable metadata index, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read metadata index, starting empty");
                HashMap::new()
            }
        };

        MetadataIndex {
            path,
            inner: RwLock::new(records),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn get(&self, file_id: &str) -> Option<FileRecord> {
        self.inner.read().await.get(file_id).cloned()
    }

    /// Owner-scoped lookup. An owner mismatch reads the same as an absent
    /// id, so ids cannot be probed across owners.
    pub async fn get_for_owner(&self, file_id: &str, owner_id: i64) -> Option<FileRecord> {
        self.inner
            .read()
            .await
            .get(file_id)
            .filter(|r| r.owner_id == owner_id)
            .cloned()
    }

    /// Insert a record and flush. An existing record under the same id is
    /// silently overwritten; id uniqueness is the caller's responsibility.
    ///
    /// A failed flush rolls the insert back before the error propagates, so
    /// memory never shows a record that disk does not hold.
    pub async fn put(&self, record: FileRecord) -> AppResult<()> {
        let file_id = record.file_id.clone();
        let mut guard = self.inner.write().await;
        let previous = guard.insert(file_id.clone(), record);
        if let Err(e) = Self::flush(&self.path, &guard).await {
            match previous {
                Some(prev) => guard.insert(file_id, prev),
                None => guard.remove(&file_id),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Remove a record and flush. Returns whether a record was present.
    ///
    /// A failed flush reinstates the record before the error propagates; the
    /// durable copy still holds it, so memory must too.
    pub async fn remove(&self, file_id: &str) -> AppResult<bool> {
        let mut guard = self.inner.write().await;
        let Some(removed) = guard.remove(file_id) else {
            return Ok(false);
        };
        if let Err(e) = Self::flush(&self.path, &guard).await {
            guard.insert(file_id.to_string(), removed);
            return Err(e);
        }
        Ok(true)
    }

    /// Full snapshot of all records.
    pub async fn all(&self) -> Vec<FileRecord> {
        self.inner.read().await.values().cloned().collect()
    }

    /// Snapshot of one owner's records, newest first.
    pub async fn for_owner(&self, owner_id: i64) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self
            .inner
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Write-through flush, called with the write guard held so concurrent
    /// mutations can never interleave their writes to the durable file.
    async fn flush(path: &Path, records: &HashMap<String, FileRecord>) -> AppResult<()> {
        let bytes = serde_json::to_vec_pretty(records)
            .map_err(|e| AppError::DurabilityFailure(format!("Failed to encode index: {}", e)))?;

        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> AppResult<()> {
            use std::io::Write;

            let dir = path.parent().ok_or_else(|| {
                AppError::DurabilityFailure(format!("Index path has no parent: {}", path.display()))
            })?;
            std::fs::create_dir_all(dir).map_err(|e| {
                AppError::DurabilityFailure(format!("Failed to create index directory: {}", e))
            })?;

            let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
                AppError::DurabilityFailure(format!("Failed to create index temp file: {}", e))
            })?;
            tmp.write_all(&bytes).map_err(|e| {
                AppError::DurabilityFailure(format!("Failed to write index: {}", e))
            })?;
            tmp.as_file().sync_all().map_err(|e| {
                AppError::DurabilityFailure(format!("Failed to sync index: {}", e))
            })?;
            tmp.persist(&path).map_err(|e| {
                AppError::DurabilityFailure(format!("Failed to replace index file: {}", e))
            })?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::DurabilityFailure(format!("Index flush task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use filedrop_core::{CompressionAlgorithm, StorageKind, StorageLocation};
    use tempfile::tempdir;

    fn record(file_id: &str, owner_id: i64, created_secs: i64) -> FileRecord {
        FileRecord {
            file_id: file_id.to_string(),
            owner_id,
            original_name: format!("{}.txt", file_id),
            original_size: 100,
            compressed_size: 40,
            algorithm: CompressionAlgorithm::Gzip,
            compression_ratio: 60.0,
            locations: vec![StorageLocation::new(
                StorageKind::Local,
                format!("/vault/user_{}/{}", owner_id, file_id),
            )],
            primary_kind: StorageKind::Local,
            created_at: Utc.timestamp_opt(created_secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let index = MetadataIndex::load(dir.path().join("file_metadata.json")).await;
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file_metadata.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        let index = MetadataIndex::load(&path).await;
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn put_is_durable_across_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file_metadata.json");

        let index = MetadataIndex::load(&path).await;
        index.put(record("f1", 7, 1000)).await.unwrap();
        index.put(record("f2", 8, 2000)).await.unwrap();

        let reloaded = MetadataIndex::load(&path).await;
        assert_eq!(reloaded.len().await, 2);
        assert_eq!(reloaded.get("f1").await.unwrap().owner_id, 7);
    }

    #[tokio::test]
    async fn owner_scoping() {
        let dir = tempdir().unwrap();
        let index = MetadataIndex::load(dir.path().join("idx.json")).await;
        index.put(record("f1", 7, 1000)).await.unwrap();

        assert!(index.get_for_owner("f1", 7).await.is_some());
        assert!(index.get_for_owner("f1", 8).await.is_none());
        assert!(index.get_for_owner("ghost", 7).await.is_none());
    }

    #[tokio::test]
    async fn same_id_overwrites() {
        let dir = tempdir().unwrap();
        let index = MetadataIndex::load(dir.path().join("idx.json")).await;
        index.put(record("f1", 7, 1000)).await.unwrap();
        index.put(record("f1", 9, 2000)).await.unwrap();

        assert_eq!(index.len().await, 1);
        assert_eq!(index.get("f1").await.unwrap().owner_id, 9);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx.json");
        let index = MetadataIndex::load(&path).await;
        index.put(record("f1", 7, 1000)).await.unwrap();

        assert!(index.remove("f1").await.unwrap());
        assert!(!index.remove("f1").await.unwrap());

        let reloaded = MetadataIndex::load(&path).await;
        assert!(reloaded.is_empty().await);
    }

    #[tokio::test]
    async fn for_owner_sorted_newest_first() {
        let dir = tempdir().unwrap();
        let index = MetadataIndex::load(dir.path().join("idx.json")).await;
        index.put(record("old", 7, 1000)).await.unwrap();
        index.put(record("new", 7, 3000)).await.unwrap();
        index.put(record("mid", 7, 2000)).await.unwrap();
        index.put(record("other", 8, 5000)).await.unwrap();

        let records = index.for_owner(7).await;
        let ids: Vec<&str> = records.iter().map(|r| r.file_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn flush_leaves_no_temp_litter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx.json");
        let index = MetadataIndex::load(&path).await;
        index.put(record("f1", 7, 1000)).await.unwrap();
        index.put(record("f2", 7, 2000)).await.unwrap();
        index.remove("f1").await.unwrap();

        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec!["idx.json"]);
    }

    #[tokio::test]
    async fn failed_flush_rolls_back_insert() {
        let dir = tempdir().unwrap();
        // A regular file where the index directory should be makes every
        // flush fail.
        let blocked = dir.path().join("blocked");
        tokio::fs::write(&blocked, b"in the way").await.unwrap();
        let index = MetadataIndex::load(blocked.join("idx.json")).await;

        let err = index.put(record("f1", 7, 1000)).await.unwrap_err();
        assert!(matches!(err, AppError::DurabilityFailure(_)));
        assert!(index.get("f1").await.is_none());
        assert!(index.is_empty().await);
    }

    #[tokio::test]
    async fn failed_flush_rolls_back_overwrite_and_remove() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let index = MetadataIndex::load(sub.join("idx.json")).await;
        index.put(record("f1", 7, 1000)).await.unwrap();

        // Replace the index directory with a regular file so later flushes
        // fail while the in-memory state already holds a record.
        tokio::fs::remove_dir_all(&sub).await.unwrap();
        tokio::fs::write(&sub, b"blocked").await.unwrap();

        let err = index.put(record("f1", 9, 2000)).await.unwrap_err();
        assert!(matches!(err, AppError::DurabilityFailure(_)));
        assert_eq!(index.get("f1").await.unwrap().owner_id, 7);

        let err = index.remove("f1").await.unwrap_err();
        assert!(matches!(err, AppError::DurabilityFailure(_)));
        assert!(index.get("f1").await.is_some());
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_puts_lose_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("idx.json");
        let index = std::sync::Arc::new(MetadataIndex::load(&path).await);

        let mut tasks = Vec::new();
        for i in 0..16i64 {
            let index = index.clone();
            tasks.push(tokio::spawn(async move {
                index.put(record(&format!("f{}", i), 7, 1000 + i)).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(index.len().await, 16);
        let reloaded = MetadataIndex::load(&path).await;
        assert_eq!(reloaded.len().await, 16);
    }
}
