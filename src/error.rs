use std::path::PathBuf;

use thiserror::Error;

use crate::features::FeatureError;

/// Failure of a batch run, naming the stage and, past manifest loading,
/// the identifier being processed. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load manifest {}: {reason:#}", .path.display())]
    DataLoad { path: PathBuf, reason: anyhow::Error },

    #[error("[{identifier}] failed to decode audio {}: {reason:#}", .path.display())]
    AudioDecode {
        identifier: String,
        path: PathBuf,
        reason: anyhow::Error,
    },

    #[error("[{identifier}] feature extraction failed: {source}")]
    Feature {
        identifier: String,
        #[source]
        source: FeatureError,
    },

    #[error("[{identifier}] failed to write {}: {source}", .path.display())]
    Write {
        identifier: String,
        path: PathBuf,
        #[source]
        source: WriteError,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl PipelineError {
    /// Identifier of the item that failed, if the failure was per item.
    pub fn identifier(&self) -> Option<&str> {
        match self {
            PipelineError::AudioDecode { identifier, .. }
            | PipelineError::Feature { identifier, .. }
            | PipelineError::Write { identifier, .. } => Some(identifier),
            PipelineError::DataLoad { .. } | PipelineError::WorkerPool(_) => None,
        }
    }
}

/// Artifact persistence failure.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("output directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Npy(#[from] ndarray_npy::WriteNpyError),
}
