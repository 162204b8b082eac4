//! Filedrop CLI: local tooling over the storage orchestrator.
//!
//! Runs against the configured data directory with the local vault only;
//! remote backends are wired up by the bot process, not this binary.
//! Configuration comes from the environment (see `filedrop_core::Config`).

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use filedrop_cli::{format_size, init_tracing};
use filedrop_core::{
    generate_file_id, Config, FileCategory, FileDescriptor, UserPrefs,
};
use filedrop_services::StorageOrchestrator;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "filedrop", about = "Filedrop storage CLI")]
struct Cli {
    /// Owner id to act as
    #[arg(long, default_value = "0")]
    owner: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress and store a file, printing its id and reference
    Upload {
        /// Path to the file to upload
        file: PathBuf,
        /// Compression algorithm: zip, gzip, or zstd (default from config)
        #[arg(long)]
        algorithm: Option<String>,
        /// Compression level 1-9 (default from config)
        #[arg(long)]
        level: Option<u32>,
    },
    /// Download and decompress a stored file
    Download {
        /// File id returned by upload
        file_id: String,
    },
    /// List stored files, newest first
    List,
    /// Delete a stored file
    Delete {
        /// File id returned by upload
        file_id: String,
    },
    /// Show local vault usage
    Info,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let cli = Cli::parse();
    let orch = StorageOrchestrator::new(config.clone()).await?;

    match cli.command {
        Commands::Upload {
            file,
            algorithm,
            level,
        } => {
            let algorithm = match algorithm {
                Some(s) => s.parse()?,
                None => config.default_compression,
            };
            let prefs = UserPrefs::new(algorithm, level.unwrap_or(config.compression_level));

            let size = tokio::fs::metadata(&file)
                .await
                .with_context(|| format!("Cannot read {}", file.display()))?
                .len();
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("file")
                .to_string();
            let descriptor = FileDescriptor::new(&name, size, FileCategory::Document);

            let file_id = generate_file_id();
            let reference = orch
                .upload(&file, &file_id, cli.owner, descriptor, prefs)
                .await?;

            println!("{}", file_id);
            println!("{}", reference);
        }
        Commands::Download { file_id } => {
            let download = orch.download(&file_id, cli.owner, None).await?;
            println!(
                "{} ({}) -> {}",
                download.original_name,
                format_size(download.original_size),
                download.path.display()
            );
        }
        Commands::List => {
            let files = orch.list(cli.owner).await;
            print_json(&files)?;
        }
        Commands::Delete { file_id } => {
            if orch.delete(&file_id, cli.owner).await? {
                println!("deleted {}", file_id);
            } else {
                println!("not found: {}", file_id);
            }
        }
        Commands::Info => {
            let usage = orch.storage_info().await?;
            println!("{} files, {}", usage.files, format_size(usage.bytes));
        }
    }

    Ok(())
}
