//! Local vault: the durability floor.
//!
//! Every upload is copied into a per-owner directory under the vault root.
//! Unlike the remote backends this write is never best-effort: if it fails,
//! the whole upload fails and no record is created.

use std::path::{Path, PathBuf};

use filedrop_core::{AppError, AppResult};
use tokio::fs;

/// Aggregate usage of the vault tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultUsage {
    pub files: u64,
    pub bytes: u64,
}

/// Per-owner local backup storage.
#[derive(Debug, Clone)]
pub struct LocalVault {
    root: PathBuf,
}

impl LocalVault {
    /// Create a vault rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::DurabilityFailure(format!(
                "Failed to create vault directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(LocalVault { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_dir(&self, owner_id: i64) -> PathBuf {
        self.root.join(format!("user_{}", owner_id))
    }

    /// Copy `src` into the owner's directory under a deterministic name and
    /// return the stored path. This is the durability floor: any failure
    /// here is a `DurabilityFailure`.
    pub async fn store(&self, owner_id: i64, file_id: &str, src: &Path) -> AppResult<PathBuf> {
        let basename = sanitize_component(
            src.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        );
        let file_id = sanitize_component(file_id);

        let dir = self.owner_dir(owner_id);
        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::DurabilityFailure(format!(
                "Failed to create owner directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let dest = dir.join(format!("{}_{}", file_id, basename));
        self.check_contained(&dest)?;

        let start = std::time::Instant::now();
        let bytes = fs::copy(src, &dest).await.map_err(|e| {
            AppError::DurabilityFailure(format!(
                "Failed to copy {} to {}: {}",
                src.display(),
                dest.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %dest.display(),
            owner_id,
            size_bytes = bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local backup stored"
        );

        Ok(dest)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Remove a stored backup. Missing files are fine; deletion is
    /// best-effort everywhere it is called.
    pub async fn remove(&self, path: &Path) -> AppResult<()> {
        self.check_contained(path)?;
        if !self.exists(path).await {
            return Ok(());
        }
        fs::remove_file(path).await?;
        tracing::info!(path = %path.display(), "Local backup removed");
        Ok(())
    }

    /// Walk the vault tree and total up file count and bytes.
    pub async fn usage(&self) -> AppResult<VaultUsage> {
        let mut usage = VaultUsage::default();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            while let Some(entry) = entries.next_entry().await? {
                let meta = match entry.metadata().await {
                    Ok(meta) => meta,
                    Err(_) => continue,
                };
                if meta.is_dir() {
                    pending.push(entry.path());
                } else {
                    usage.files += 1;
                    usage.bytes += meta.len();
                }
            }
        }

        Ok(usage)
    }

    /// Reject paths that resolve outside the vault root.
    fn check_contained(&self, path: &Path) -> AppResult<()> {
        if path.components().any(|c| c.as_os_str() == "..") || !path.starts_with(&self.root) {
            return Err(AppError::InvalidInput(format!(
                "Path resolves outside the vault: {}",
                path.display()
            )));
        }
        Ok(())
    }
}

/// Strip path separators and traversal sequences from a name component.
fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
