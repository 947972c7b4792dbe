//! Batch conversion of manifest-listed audio files into fixed-shape
//! CQT / MFCC feature arrays stored as `.npy` files.

pub mod audio;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod shape;

pub use config::{FeatureKind, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::{run, RunSummary};
