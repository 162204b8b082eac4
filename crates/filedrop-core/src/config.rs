//! Configuration module
//!
//! Environment-driven settings for storage paths, backend credentials, and
//! compression defaults. Every knob has a default except the optional
//! backend credentials; backend timeouts live here so call sites never
//! hardcode them.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::CompressionAlgorithm;

const DEFAULT_DATA_DIR: &str = "./filedrop-data";
const DEFAULT_MAX_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024; // 4 GiB
const DEFAULT_COMPRESSION_LEVEL: u32 = 6;
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Root directory for the vault, the staging area, and the index file.
    pub data_dir: PathBuf,
    /// Private channel used as message-oriented object storage, if any.
    pub storage_channel_id: Option<i64>,
    /// Cloud drive credentials, if any. Both must be present for the cloud
    /// backend to be considered configured.
    pub cloud_email: Option<String>,
    pub cloud_password: Option<String>,
    pub max_file_size: u64,
    pub default_compression: CompressionAlgorithm,
    pub compression_level: u32,
    /// Bound on every remote backend call. On expiry the attempt is treated
    /// like any other backend failure.
    pub backend_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());

        let storage_channel_id = env::var("STORAGE_CHANNEL_ID")
            .ok()
            .and_then(|v| v.parse::<i64>().ok());

        let cloud_email = env::var("CLOUD_EMAIL").ok().filter(|v| !v.is_empty());
        let cloud_password = env::var("CLOUD_PASSWORD").ok().filter(|v| !v.is_empty());

        let max_file_size = env::var("MAX_FILE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_MAX_FILE_SIZE);

        let default_compression = env::var("DEFAULT_COMPRESSION")
            .unwrap_or_else(|_| "zip".to_string())
            .parse::<CompressionAlgorithm>()?;

        let compression_level = env::var("COMPRESSION_LEVEL")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_COMPRESSION_LEVEL);

        let backend_timeout_secs = env::var("BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS);

        let config = Config {
            data_dir: PathBuf::from(data_dir),
            storage_channel_id,
            cloud_email,
            cloud_password,
            max_file_size,
            default_compression,
            compression_level,
            backend_timeout: Duration::from_secs(backend_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(1..=9).contains(&self.compression_level) {
            anyhow::bail!(
                "COMPRESSION_LEVEL must be between 1 and 9, got {}",
                self.compression_level
            );
        }
        if self.backend_timeout.is_zero() {
            anyhow::bail!("BACKEND_TIMEOUT_SECS must be positive");
        }
        if self.cloud_email.is_some() != self.cloud_password.is_some() {
            anyhow::bail!("CLOUD_EMAIL and CLOUD_PASSWORD must be set together");
        }
        Ok(())
    }

    /// True when both cloud credentials are present.
    pub fn cloud_configured(&self) -> bool {
        self.cloud_email.is_some() && self.cloud_password.is_some()
    }

    pub fn vault_dir(&self) -> PathBuf {
        self.data_dir.join("vault")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.data_dir.join("staging")
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join("file_metadata.json")
    }

    /// A config suitable for tests and local tooling: everything defaulted,
    /// no remote backends, rooted at the given directory.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Config {
            data_dir: data_dir.into(),
            storage_channel_id: None,
            cloud_email: None,
            cloud_password: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            default_compression: CompressionAlgorithm::Zip,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        }
    }
}
