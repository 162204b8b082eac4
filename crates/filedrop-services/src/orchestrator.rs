//! Storage orchestrator
//!
//! Coordinates the full upload/download lifecycle: compress, attempt remote
//! backends best-effort in priority order, always write the local backup
//! (the durability floor), record metadata write-through, and reverse the
//! process on download with channel-first fallback.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use filedrop_core::{
    AppError, AppResult, Config, FileDescriptor, FileRecord, FileSummary, StorageKind,
    StorageLocation, UserPrefs,
};
use filedrop_processing::{CodecError, Compressor};
use filedrop_storage::{
    BackendError, BackendResult, ChannelRef, ChannelStore, CloudStore, LocalVault, MetadataIndex,
    VaultUsage,
};

use crate::progress::{ProgressSink, ProgressStage};

/// Result of a successful download: the decompressed file plus the original
/// name and size recorded at upload time.
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    pub original_name: String,
    pub original_size: u64,
}

/// The core of the system. Explicitly constructed with its collaborators;
/// no ambient singletons.
pub struct StorageOrchestrator {
    config: Config,
    index: Arc<MetadataIndex>,
    vault: LocalVault,
    compressor: Compressor,
    channel: Option<Arc<dyn ChannelStore>>,
    cloud: Option<Arc<dyn CloudStore>>,
}

impl StorageOrchestrator {
    /// Build an orchestrator from configuration: creates the vault and
    /// staging directories and loads the index. Remote backends are attached
    /// afterwards with [`with_channel`](Self::with_channel) /
    /// [`with_cloud`](Self::with_cloud).
    pub async fn new(config: Config) -> AppResult<Self> {
        let vault = LocalVault::new(config.vault_dir()).await?;
        tokio::fs::create_dir_all(config.staging_dir()).await?;
        let index = Arc::new(MetadataIndex::load(config.index_path()).await);

        Ok(StorageOrchestrator {
            config,
            index,
            vault,
            compressor: Compressor::new(),
            channel: None,
            cloud: None,
        })
    }

    pub fn with_channel(mut self, channel: Arc<dyn ChannelStore>) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_cloud(mut self, cloud: Arc<dyn CloudStore>) -> Self {
        self.cloud = Some(cloud);
        self
    }

    pub fn index(&self) -> &Arc<MetadataIndex> {
        &self.index
    }

    /// Upload a file: compress, attempt the remote backends best-effort,
    /// write the local backup, persist the record, and return the public
    /// reference of the primary location.
    ///
    /// Files larger than the configured maximum are rejected up front.
    /// `file_id` uniqueness is the caller's responsibility; a colliding id
    /// silently overwrites the previous record.
    pub async fn upload(
        &self,
        local_path: &Path,
        file_id: &str,
        owner_id: i64,
        descriptor: FileDescriptor,
        prefs: UserPrefs,
    ) -> AppResult<String> {
        if descriptor.original_size > self.config.max_file_size {
            return Err(AppError::InvalidInput(format!(
                "File is {} bytes, larger than the {} byte limit",
                descriptor.original_size, self.config.max_file_size
            )));
        }

        let compressed = self
            .compressor
            .compress(local_path, prefs.algorithm, prefs.level)
            .await
            .map_err(codec_error)?;
        let compressed_size = match tokio::fs::metadata(&compressed).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                let _ = tokio::fs::remove_file(&compressed).await;
                return Err(e.into());
            }
        };

        // Remote backends, best-effort, in priority order. A failure here is
        // logged and absorbed; it can never fail the upload.
        let mut locations: Vec<StorageLocation> = Vec::new();
        for kind in [StorageKind::Channel, StorageKind::Cloud] {
            match self
                .attempt_remote_upload(kind, &compressed, file_id, owner_id, &descriptor)
                .await
            {
                Ok(Some(location)) => locations.push(location),
                Ok(None) => {
                    tracing::debug!(backend = %kind, file_id, "Backend not configured, skipping")
                }
                Err(e) => {
                    tracing::warn!(backend = %kind, file_id, error = %e, "Best-effort upload failed")
                }
            }
        }

        // The durability floor. Failure here aborts the upload; no record is
        // created.
        let stored_path = match self.vault.store(owner_id, file_id, &compressed).await {
            Ok(path) => path,
            Err(e) => {
                let _ = tokio::fs::remove_file(&compressed).await;
                return Err(e);
            }
        };
        locations.push(StorageLocation::new(
            StorageKind::Local,
            stored_path.to_string_lossy().into_owned(),
        ));

        // The compressed intermediate is staged next to the input; the vault
        // copy is the persistent one.
        if let Err(e) = tokio::fs::remove_file(&compressed).await {
            tracing::debug!(path = %compressed.display(), error = %e, "Failed to remove compressed temp file");
        }

        let primary_kind = StorageKind::PRIORITY
            .into_iter()
            .find(|kind| locations.iter().any(|loc| loc.kind == *kind))
            .unwrap_or(StorageKind::Local);

        let stats = Compressor::stats(descriptor.original_size, compressed_size);
        let record = FileRecord {
            file_id: file_id.to_string(),
            owner_id,
            original_name: descriptor.original_name,
            original_size: descriptor.original_size,
            compressed_size,
            algorithm: prefs.algorithm,
            compression_ratio: stats.compression_ratio,
            locations,
            primary_kind,
            created_at: Utc::now(),
        };
        let reference = record
            .public_reference()
            .unwrap_or_default()
            .to_string();

        // A record that cannot be committed must not leave a vault copy
        // behind: the index is the source of truth for existence.
        if let Err(e) = self.index.put(record).await {
            if let Err(re) = self.vault.remove(&stored_path).await {
                tracing::warn!(file_id, error = %re, "Failed to remove vault copy after index failure");
            }
            return Err(e);
        }

        tracing::info!(
            file_id,
            owner_id,
            primary = %primary_kind,
            compressed_size,
            "File uploaded"
        );
        Ok(reference)
    }

    /// Download a file: fetch from the channel backend when possible, fall
    /// back to the local backup, decompress, and return the original
    /// name/size recorded at upload time.
    pub async fn download(
        &self,
        file_id: &str,
        owner_id: i64,
        progress: Option<&dyn ProgressSink>,
    ) -> AppResult<Download> {
        let record = self
            .index
            .get_for_owner(file_id, owner_id)
            .await
            .ok_or_else(|| AppError::NotFound(file_id.to_string()))?;

        notify(progress, ProgressStage::FetchStart).await;

        // Channel first; any failure falls through to the local backup.
        let mut staged: Option<PathBuf> = None;
        if let (Some(location), Some(channel)) =
            (record.location(StorageKind::Channel), self.channel.as_ref())
        {
            match self.fetch_from_channel(channel.as_ref(), location, &record).await {
                Ok(path) => staged = Some(path),
                Err(e) => {
                    tracing::warn!(file_id, error = %e, "Channel fetch failed, using local backup")
                }
            }
        }

        let compressed_path = match &staged {
            Some(path) => path.clone(),
            None => {
                let location = record.location(StorageKind::Local).ok_or_else(|| {
                    AppError::DurabilityFailure(format!(
                        "Record {} has no local backup location",
                        file_id
                    ))
                })?;
                let path = PathBuf::from(&location.locator);
                if !self.vault.exists(&path).await {
                    // The durability floor is gone: data loss, no further
                    // fallback.
                    return Err(AppError::DurabilityFailure(format!(
                        "Local backup missing for {}: {}",
                        file_id,
                        path.display()
                    )));
                }
                path
            }
        };

        notify(progress, ProgressStage::FetchComplete).await;

        // Only the base name of the recorded original participates in the
        // staging filename.
        let safe_name = Path::new(&record.original_name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file");
        let output = self.config.staging_dir().join(format!(
            "{}_{}_{}",
            file_id,
            Utc::now().timestamp_micros(),
            safe_name
        ));
        let result = self
            .compressor
            .decompress(&compressed_path, Some(output))
            .await
            .map_err(codec_error);

        // A temp file staged for a remote fetch is removed whatever the
        // decompression outcome; the persistent local backup stays.
        if let Some(path) = staged {
            if let Err(e) = tokio::fs::remove_file(&path).await {
                tracing::debug!(path = %path.display(), error = %e, "Failed to remove staged download");
            }
        }

        let path = result?;
        notify(progress, ProgressStage::DecompressComplete).await;

        tracing::info!(file_id, owner_id, path = %path.display(), "File downloaded");
        Ok(Download {
            path,
            original_name: record.original_name,
            original_size: record.original_size,
        })
    }

    /// Delete a file everywhere, best-effort for the storage copies and
    /// unconditional for the metadata record. Returns false when no record
    /// exists for this owner, true once the index mutation has committed.
    pub async fn delete(&self, file_id: &str, owner_id: i64) -> AppResult<bool> {
        let record = match self.index.get_for_owner(file_id, owner_id).await {
            Some(record) => record,
            None => return Ok(false),
        };

        if let Some(location) = record.location(StorageKind::Local) {
            if let Err(e) = self.vault.remove(Path::new(&location.locator)).await {
                tracing::warn!(file_id, error = %e, "Failed to remove local backup");
            }
        }

        if let (Some(location), Some(channel)) =
            (record.location(StorageKind::Channel), self.channel.as_ref())
        {
            match location.locator.parse::<ChannelRef>() {
                Ok(reference) => {
                    if let Err(e) = self
                        .with_timeout(channel.delete(&reference))
                        .await
                    {
                        tracing::warn!(file_id, error = %e, "Failed to delete channel object");
                    }
                }
                Err(e) => {
                    tracing::warn!(file_id, error = %e, "Malformed channel locator on delete")
                }
            }
        }

        // The metadata record is the source of truth for existence; its
        // removal decides the return value regardless of the remote outcomes.
        self.index.remove(file_id).await?;
        tracing::info!(file_id, owner_id, "File deleted");
        Ok(true)
    }

    /// One owner's files, newest first. A plain snapshot; no pagination.
    pub async fn list(&self, owner_id: i64) -> Vec<FileSummary> {
        self.index
            .for_owner(owner_id)
            .await
            .iter()
            .map(FileRecord::summary)
            .collect()
    }

    /// Aggregate usage of the local vault.
    pub async fn storage_info(&self) -> AppResult<VaultUsage> {
        self.vault.usage().await
    }

    /// One best-effort remote upload attempt. `Ok(None)` means the backend
    /// is not configured; errors are absorbed by the caller.
    async fn attempt_remote_upload(
        &self,
        kind: StorageKind,
        compressed: &Path,
        file_id: &str,
        owner_id: i64,
        descriptor: &FileDescriptor,
    ) -> BackendResult<Option<StorageLocation>> {
        match kind {
            StorageKind::Channel => {
                let Some(channel) = self.channel.as_ref() else {
                    return Ok(None);
                };
                let caption = format!(
                    "File ID: {}\nUser: {}\nOriginal: {}",
                    file_id, owner_id, descriptor.original_name
                );
                let reference = self
                    .with_timeout(channel.upload(compressed, &caption))
                    .await?;
                Ok(Some(
                    StorageLocation::new(StorageKind::Channel, reference.locator())
                        .with_public_url(reference.public_url),
                ))
            }
            StorageKind::Cloud => {
                let Some(cloud) = self.cloud.as_ref() else {
                    return Ok(None);
                };
                let url = self
                    .with_timeout(cloud.upload(compressed, &descriptor.original_name))
                    .await?;
                Ok(Some(StorageLocation::new(StorageKind::Cloud, url)))
            }
            StorageKind::Local => Ok(None),
        }
    }

    async fn fetch_from_channel(
        &self,
        channel: &dyn ChannelStore,
        location: &StorageLocation,
        record: &FileRecord,
    ) -> BackendResult<PathBuf> {
        let reference: ChannelRef = location.locator.parse()?;
        let dest = self.config.staging_dir().join(format!(
            "channel_{}_{}.{}",
            record.file_id,
            Utc::now().timestamp_micros(),
            record.algorithm.extension()
        ));
        self.with_timeout(channel.fetch(&reference, &dest)).await?;
        Ok(dest)
    }

    /// Bound a remote call by the configured timeout; expiry reads exactly
    /// like any other backend failure.
    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = BackendResult<T>>,
    ) -> BackendResult<T> {
        match tokio::time::timeout(self.config.backend_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(self.config.backend_timeout.as_secs())),
        }
    }
}

async fn notify(progress: Option<&dyn ProgressSink>, stage: ProgressStage) {
    if let Some(sink) = progress {
        sink.update(stage).await;
    }
}

fn codec_error(err: CodecError) -> AppError {
    match err {
        CodecError::UnsupportedLevel(_) | CodecError::UnknownExtension(_) => {
            AppError::UnsupportedOperation(err.to_string())
        }
        CodecError::InputNotFound(_) => AppError::InvalidInput(err.to_string()),
        other => AppError::Internal(other.to_string()),
    }
}
