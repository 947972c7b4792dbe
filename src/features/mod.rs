pub mod cqt;
pub mod db;
pub mod mel;
pub mod mfcc;
pub mod stft;

use ndarray::Array2;
use thiserror::Error;

use crate::audio::Waveform;
use crate::config::FeatureKind;

pub use cqt::{CqtConfig, CqtExtractor};
pub use db::DbReference;
pub use mfcc::{MfccConfig, MfccExtractor};

/// Feature matrix laid out as (bins, time frames).
pub type FeatureMatrix = Array2<f32>;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("highest CQT bin ({highest_hz:.1} Hz) exceeds Nyquist ({nyquist_hz:.1} Hz)")]
    NyquistExceeded { highest_hz: f64, nyquist_hz: f64 },

    #[error("invalid feature configuration: {0}")]
    InvalidConfig(String),

    #[error("FFT failed: {0}")]
    Fft(String),
}

/// Strategy that turns one waveform into one feature matrix.
///
/// Implementations must be stateless across calls so the batch runner can
/// share one instance between workers.
pub trait FeatureExtractor: Send + Sync {
    fn kind(&self) -> FeatureKind;

    fn extract(&self, waveform: &Waveform) -> Result<FeatureMatrix, FeatureError>;
}

/// Default extractor for a feature kind.
pub fn extractor_for(kind: FeatureKind) -> Box<dyn FeatureExtractor> {
    match kind {
        FeatureKind::Cqt => Box::new(CqtExtractor::default()),
        FeatureKind::Mfcc => Box::new(MfccExtractor::default()),
    }
}
