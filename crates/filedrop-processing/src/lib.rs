//! Filedrop Processing Library
//!
//! File compression and decompression for the storage pipeline. All codec
//! work runs on the blocking thread pool so it never stalls the async
//! scheduler.

pub mod compression;

pub use compression::{CodecError, CodecResult, CompressionStats, Compressor};
