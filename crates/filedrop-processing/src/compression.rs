//! File compression codecs
//!
//! Wraps zip, gzip, and zstd behind one interface. Compression appends the
//! algorithm's canonical extension; decompression detects the algorithm from
//! that extension alone. A failed compression never leaves a partial output
//! file behind.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use filedrop_core::CompressionAlgorithm;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Compression level must be between 1 and 9, got {0}")]
    UnsupportedLevel(u32),

    #[error("Unable to determine compression type from filename: {0}")]
    UnknownExtension(PathBuf),

    #[error("Archive is empty: {0}")]
    EmptyArchive(PathBuf),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Compression statistics derived from the two sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionStats {
    pub original_size: u64,
    pub compressed_size: u64,
    /// Percentage saved: `(1 - compressed/original) * 100`, 0 for empty input.
    pub compression_ratio: f64,
    pub space_saved: i64,
}

/// The codec adapter. Stateless; cheap to clone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compressor;

impl Compressor {
    pub fn new() -> Self {
        Compressor
    }

    /// Compress `input` with the given algorithm and level (1-9).
    ///
    /// The output is a sibling file named `{input}.{ext}`. Work is offloaded
    /// to the blocking pool; on any failure the partial output is removed
    /// before the error is returned.
    pub async fn compress(
        &self,
        input: &Path,
        algorithm: CompressionAlgorithm,
        level: u32,
    ) -> CodecResult<PathBuf> {
        if !(1..=9).contains(&level) {
            return Err(CodecError::UnsupportedLevel(level));
        }
        if !input.is_file() {
            return Err(CodecError::InputNotFound(input.to_path_buf()));
        }

        let input = input.to_path_buf();
        let output = appended_extension(&input, algorithm.extension());

        tracing::info!(
            input = %input.display(),
            algorithm = %algorithm,
            level,
            "Compressing file"
        );

        let out = output.clone();
        let result = tokio::task::spawn_blocking(move || {
            let run = || -> CodecResult<()> {
                match algorithm {
                    CompressionAlgorithm::Zip => compress_zip(&input, &out, level),
                    CompressionAlgorithm::Gzip => compress_gzip(&input, &out, level),
                    CompressionAlgorithm::Zstd => compress_zstd(&input, &out, level),
                }
            };
            let res = run();
            if res.is_err() {
                // No partial output may survive a failed compression.
                let _ = std::fs::remove_file(&out);
            }
            res
        })
        .await
        .map_err(|e| CodecError::Codec(format!("compression task panicked: {}", e)))?;

        result?;
        tracing::info!(output = %output.display(), "Compression complete");
        Ok(output)
    }

    /// Decompress `input`, detecting the algorithm from its extension.
    ///
    /// The default output path is the input path minus the compression
    /// suffix. Zip archives yield their first entry.
    pub async fn decompress(
        &self,
        input: &Path,
        output: Option<PathBuf>,
    ) -> CodecResult<PathBuf> {
        if !input.is_file() {
            return Err(CodecError::InputNotFound(input.to_path_buf()));
        }
        let algorithm = CompressionAlgorithm::from_extension(input)
            .ok_or_else(|| CodecError::UnknownExtension(input.to_path_buf()))?;

        let input = input.to_path_buf();
        let output = output.unwrap_or_else(|| input.with_extension(""));

        tracing::info!(
            input = %input.display(),
            algorithm = %algorithm,
            "Decompressing file"
        );

        let out = output.clone();
        tokio::task::spawn_blocking(move || {
            let run = || -> CodecResult<()> {
                match algorithm {
                    CompressionAlgorithm::Zip => decompress_zip(&input, &out),
                    CompressionAlgorithm::Gzip => decompress_gzip(&input, &out),
                    CompressionAlgorithm::Zstd => decompress_zstd(&input, &out),
                }
            };
            let res = run();
            if res.is_err() {
                let _ = std::fs::remove_file(&out);
            }
            res
        })
        .await
        .map_err(|e| CodecError::Codec(format!("decompression task panicked: {}", e)))??;

        Ok(output)
    }

    /// Derive compression statistics from the two sizes.
    pub fn stats(original_size: u64, compressed_size: u64) -> CompressionStats {
        let compression_ratio = if original_size == 0 {
            0.0
        } else {
            (1.0 - compressed_size as f64 / original_size as f64) * 100.0
        };
        CompressionStats {
            original_size,
            compressed_size,
            compression_ratio,
            space_saved: original_size as i64 - compressed_size as i64,
        }
    }

    /// Recommend an algorithm from the file's extension and size.
    pub fn recommend(path: &Path, file_size: u64) -> CompressionAlgorithm {
        const TEXT_EXTENSIONS: &[&str] = &[
            "txt", "log", "csv", "json", "xml", "html", "css", "js", "py", "md", "rs",
        ];
        const PACKED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp3", "mp4", "zip", "rar", "7z"];
        const LARGE_FILE_BYTES: u64 = 100 * 1024 * 1024;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if TEXT_EXTENSIONS.contains(&ext.as_str()) {
            CompressionAlgorithm::Gzip
        } else if PACKED_EXTENSIONS.contains(&ext.as_str()) {
            // Already-compressed payloads gain nothing; zip keeps them portable.
            CompressionAlgorithm::Zip
        } else if file_size > LARGE_FILE_BYTES {
            CompressionAlgorithm::Zstd
        } else {
            CompressionAlgorithm::Zip
        }
    }
}

/// Append `.{ext}` to a path without replacing the existing extension.
fn appended_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

/// Base name of a path for use as an archive entry, stripped of any
/// directory components.
fn entry_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string()
}

fn compress_zip(input: &Path, output: &Path, level: u32) -> CodecResult<()> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let file = File::create(output)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level as i32))
        .unix_permissions(0o644);

    writer
        .start_file(entry_name(input), options)
        .map_err(|e| CodecError::Codec(format!("Failed to start zip entry: {}", e)))?;

    let mut reader = BufReader::new(File::open(input)?);
    io::copy(&mut reader, &mut writer)?;

    writer
        .finish()
        .map_err(|e| CodecError::Codec(format!("Failed to finalize zip archive: {}", e)))?;
    Ok(())
}

fn compress_gzip(input: &Path, output: &Path, level: u32) -> CodecResult<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut reader = BufReader::new(File::open(input)?);
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(output)?), Compression::new(level));
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(())
}

fn compress_zstd(input: &Path, output: &Path, level: u32) -> CodecResult<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    zstd::stream::copy_encode(&mut reader, &mut writer, level as i32)
        .map_err(|e| CodecError::Codec(format!("zstd encode failed: {}", e)))?;
    writer.flush()?;
    Ok(())
}

fn decompress_zip(input: &Path, output: &Path) -> CodecResult<()> {
    let file = File::open(input)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| CodecError::Codec(format!("Failed to open zip archive: {}", e)))?;

    if archive.len() == 0 {
        return Err(CodecError::EmptyArchive(input.to_path_buf()));
    }

    let mut entry = archive
        .by_index(0)
        .map_err(|e| CodecError::Codec(format!("Failed to read zip entry: {}", e)))?;
    let mut writer = BufWriter::new(File::create(output)?);
    io::copy(&mut entry, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn decompress_gzip(input: &Path, output: &Path) -> CodecResult<()> {
    use flate2::read::GzDecoder;

    let mut decoder = GzDecoder::new(BufReader::new(File::open(input)?));
    let mut writer = BufWriter::new(File::create(output)?);
    io::copy(&mut decoder, &mut writer)?;
    writer.flush()?;
    Ok(())
}

fn decompress_zstd(input: &Path, output: &Path) -> CodecResult<()> {
    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(output)?);
    zstd::stream::copy_decode(reader, &mut writer)
        .map_err(|e| CodecError::Codec(format!("zstd decode failed: {}", e)))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_input(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    async fn roundtrip(algorithm: CompressionAlgorithm) {
        let dir = tempdir().unwrap();
        let data: Vec<u8> = b"the quick brown fox jumps over the lazy dog\n"
            .iter()
            .cycle()
            .take(64 * 1024)
            .copied()
            .collect();
        let input = write_input(dir.path(), "payload.txt", &data);

        let compressor = Compressor::new();
        let compressed = compressor.compress(&input, algorithm, 6).await.unwrap();
        assert_eq!(
            compressed,
            dir.path().join(format!("payload.txt.{}", algorithm.extension()))
        );

        // Repetitive text must actually shrink.
        let compressed_len = std::fs::metadata(&compressed).unwrap().len();
        assert!(compressed_len < data.len() as u64);

        // Decompress to a distinct path so the original survives for comparison.
        let restored_path = dir.path().join("restored.txt");
        let restored = compressor
            .decompress(&compressed, Some(restored_path.clone()))
            .await
            .unwrap();
        assert_eq!(restored, restored_path);
        assert_eq!(std::fs::read(&restored).unwrap(), data);
    }

    #[tokio::test]
    async fn roundtrip_zip() {
        roundtrip(CompressionAlgorithm::Zip).await;
    }

    #[tokio::test]
    async fn roundtrip_gzip() {
        roundtrip(CompressionAlgorithm::Gzip).await;
    }

    #[tokio::test]
    async fn roundtrip_zstd() {
        roundtrip(CompressionAlgorithm::Zstd).await;
    }

    #[tokio::test]
    async fn default_output_strips_suffix() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), "notes.txt", b"hello");

        let compressor = Compressor::new();
        let compressed = compressor
            .compress(&input, CompressionAlgorithm::Gzip, 6)
            .await
            .unwrap();

        std::fs::remove_file(&input).unwrap();
        let restored = compressor.decompress(&compressed, None).await.unwrap();
        assert_eq!(restored, dir.path().join("notes.txt"));
        assert_eq!(std::fs::read(&restored).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn level_out_of_range_rejected() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), "a.txt", b"x");
        let compressor = Compressor::new();

        for level in [0, 10] {
            let err = compressor
                .compress(&input, CompressionAlgorithm::Gzip, level)
                .await
                .unwrap_err();
            assert!(matches!(err, CodecError::UnsupportedLevel(_)));
        }
    }

    #[tokio::test]
    async fn missing_input_rejected() {
        let dir = tempdir().unwrap();
        let compressor = Compressor::new();
        let err = compressor
            .compress(&dir.path().join("ghost.txt"), CompressionAlgorithm::Zip, 6)
            .await
            .unwrap_err();
        assert!(matches!(err, CodecError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn unknown_extension_rejected() {
        let dir = tempdir().unwrap();
        let input = write_input(dir.path(), "file.rar", b"not really");
        let compressor = Compressor::new();
        let err = compressor.decompress(&input, None).await.unwrap_err();
        assert!(matches!(err, CodecError::UnknownExtension(_)));
    }

    #[tokio::test]
    async fn corrupt_input_leaves_no_partial_output() {
        let dir = tempdir().unwrap();
        // A .zip extension over garbage bytes: decoding must fail and the
        // partial output must be cleaned up.
        let input = write_input(dir.path(), "broken.txt.zip", b"this is not a zip archive");
        let compressor = Compressor::new();

        let out = dir.path().join("broken.txt");
        let result = compressor.decompress(&input, Some(out.clone())).await;
        assert!(result.is_err());
        assert!(!out.exists());
    }

    #[test]
    fn stats_math() {
        let stats = Compressor::stats(1000, 400);
        assert!((stats.compression_ratio - 60.0).abs() < f64::EPSILON);
        assert_eq!(stats.space_saved, 600);

        let empty = Compressor::stats(0, 0);
        assert_eq!(empty.compression_ratio, 0.0);
    }

    #[test]
    fn recommendation_by_extension_and_size() {
        assert_eq!(
            Compressor::recommend(Path::new("report.csv"), 1024),
            CompressionAlgorithm::Gzip
        );
        assert_eq!(
            Compressor::recommend(Path::new("photo.jpg"), 1024),
            CompressionAlgorithm::Zip
        );
        assert_eq!(
            Compressor::recommend(Path::new("dump.bin"), 200 * 1024 * 1024),
            CompressionAlgorithm::Zstd
        );
        assert_eq!(
            Compressor::recommend(Path::new("misc.dat"), 1024),
            CompressionAlgorithm::Zip
        );
    }
}
