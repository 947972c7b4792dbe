use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::ManifestQuery;

/// Number of time frames every artifact is padded or truncated to.
pub const DEFAULT_FIXED_TIMESTEPS: usize = 150;

/// Manifest `Set` value processed when none is given.
pub const DEFAULT_SET: &str = "progress";

pub const DEFAULT_MANIFEST: &str = "files.csv";
pub const DEFAULT_AUDIO_DIR: &str = "flac";
pub const DEFAULT_AUDIO_EXTENSION: &str = "flac";

// ---------------------------------------------------------------------------
// FeatureKind
// ---------------------------------------------------------------------------

/// The feature representations the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Cqt,
    Mfcc,
}

impl FeatureKind {
    /// Output directory used when none is configured.
    pub fn default_output_dir(self) -> &'static str {
        match self {
            FeatureKind::Cqt => "cqts",
            FeatureKind::Mfcc => "mfccs",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Cqt => write!(f, "CQT"),
            FeatureKind::Mfcc => write!(f, "MFCC"),
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Everything one batch run needs. Built by the CLI; no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Tabular manifest listing the audio identifiers.
    pub manifest: PathBuf,
    /// Row selection and ordering.
    pub query: ManifestQuery,
    /// Directory holding `<identifier>.<audio_extension>` files.
    pub audio_dir: PathBuf,
    /// Extension appended to each identifier, without the dot.
    pub audio_extension: String,
    /// Directory receiving `.npy` artifacts. Must already exist.
    pub output_dir: PathBuf,
    /// Target width of the time axis.
    pub fixed_timesteps: usize,
    /// Worker count; `1` processes strictly in manifest order.
    pub jobs: usize,
}

impl PipelineConfig {
    /// Defaults for one feature kind, relative to the working directory.
    pub fn for_kind(kind: FeatureKind) -> Self {
        Self {
            manifest: PathBuf::from(DEFAULT_MANIFEST),
            query: ManifestQuery::default(),
            audio_dir: PathBuf::from(DEFAULT_AUDIO_DIR),
            audio_extension: DEFAULT_AUDIO_EXTENSION.into(),
            output_dir: PathBuf::from(kind.default_output_dir()),
            fixed_timesteps: DEFAULT_FIXED_TIMESTEPS,
            jobs: 1,
        }
    }

    /// `<audio_dir>/<identifier>.<audio_extension>`
    pub fn audio_path(&self, identifier: &str) -> PathBuf {
        self.audio_dir
            .join(format!("{identifier}.{}", self.audio_extension))
    }
}
