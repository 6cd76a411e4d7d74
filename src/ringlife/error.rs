//! Error type shared by every RingLife component.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RingLifeError>;

/// Everything that can abort a run. None of these are recovered: the first one
/// reported ends the whole simulation.
#[derive(Debug, Error)]
pub enum RingLifeError {
    /// Rejected before any worker starts.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// A neighbour hung up or sent something out of step.
    #[error("transport failure on rank {rank}: {reason}")]
    Transport { rank: usize, reason: String },
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("snapshot sink failed at generation {generation}: {source}")]
    Snapshot {
        generation: u64,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RingLifeError {
    pub(crate) fn transport(rank: usize, reason: impl Into<String>) -> Self {
        Self::Transport {
            rank,
            reason: reason.into(),
        }
    }
}
