//! File id generation.

use uuid::Uuid;

/// Generate an opaque unique file id.
///
/// Ids are caller-supplied at upload time; this is the canonical generator
/// for callers that don't bring their own scheme. Uniqueness is the caller's
/// responsibility; the index overwrites silently on collision.
pub fn generate_file_id() -> String {
    Uuid::new_v4().simple().to_string()
}
