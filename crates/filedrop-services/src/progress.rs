//! Advisory download progress reporting.

use async_trait::async_trait;

/// Coarse milestones reported during a download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    FetchStart,
    FetchComplete,
    DecompressComplete,
}

/// Receiver for progress milestones.
///
/// Purely advisory: the orchestrator reports milestones and moves on. A sink
/// cannot fail the operation; anything it needs to do with the signal
/// happens on its side of the seam.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn update(&self, stage: ProgressStage);
}
