use ndarray::Array2;

use super::db::{power_to_db, DbReference};
use super::mel::{dct_basis, mel_filterbank};
use super::stft::power_spectrogram;
use super::{FeatureError, FeatureExtractor, FeatureMatrix};
use crate::audio::Waveform;
use crate::config::FeatureKind;

/// MFCC parameters. Defaults: 13 coefficients from 128 mel bands over a
/// 2048-point STFT with hop 512, at the waveform's native rate.
#[derive(Debug, Clone)]
pub struct MfccConfig {
    pub n_mfcc: usize,
    pub n_mels: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub fmin: f64,
    /// Upper band edge; `None` means Nyquist.
    pub fmax: Option<f64>,
}

impl Default for MfccConfig {
    fn default() -> Self {
        MfccConfig {
            n_mfcc: 13,
            n_mels: 128,
            n_fft: 2048,
            hop_length: 512,
            fmin: 0.0,
            fmax: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MfccExtractor {
    pub config: MfccConfig,
}

impl MfccExtractor {
    pub fn new(config: MfccConfig) -> Self {
        Self { config }
    }
}

impl FeatureExtractor for MfccExtractor {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Mfcc
    }

    /// STFT power → mel bands → dB (ref 1.0) → DCT-II, shape `(n_mfcc, T)`.
    fn extract(&self, waveform: &Waveform) -> Result<FeatureMatrix, FeatureError> {
        let cfg = &self.config;
        if waveform.sample_rate == 0 {
            return Err(FeatureError::InvalidSampleRate(waveform.sample_rate));
        }
        if cfg.n_mfcc > cfg.n_mels {
            return Err(FeatureError::InvalidConfig(format!(
                "n_mfcc ({}) exceeds n_mels ({})",
                cfg.n_mfcc, cfg.n_mels
            )));
        }

        let sr = waveform.sample_rate as f64;
        let power = power_spectrogram(&waveform.samples, cfg.n_fft, cfg.hop_length)?;
        if power.ncols() == 0 {
            return Ok(Array2::zeros((cfg.n_mfcc, 0)));
        }

        let fmax = cfg.fmax.unwrap_or(sr / 2.0);
        let filters = mel_filterbank(sr, cfg.n_fft, cfg.n_mels, cfg.fmin, fmax);
        let mel = filters.dot(&power);
        let log_mel = power_to_db(&mel, DbReference::Unity, 1e-10);

        let dct = dct_basis(cfg.n_mfcc, cfg.n_mels);
        Ok(dct.dot(&log_mel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sr: u32, secs: f32) -> Waveform {
        let n = (sr as f32 * secs) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin())
            .collect();
        Waveform::new(samples, sr)
    }

    #[test]
    fn test_mfcc_shape() {
        let wave = sine(440.0, 22_050, 1.0);
        let m = MfccExtractor::default().extract(&wave).unwrap();
        assert_eq!(m.dim(), (13, 1 + 22_050 / 512));
        assert!(m.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_mfcc_uses_native_rate() {
        let a = MfccExtractor::default().extract(&sine(440.0, 16_000, 0.5)).unwrap();
        let b = MfccExtractor::default().extract(&sine(440.0, 44_100, 0.5)).unwrap();
        assert_eq!(a.ncols(), 1 + 8000 / 512);
        assert_eq!(b.ncols(), 1 + 22_050 / 512);
    }

    #[test]
    fn test_mfcc_empty_waveform() {
        let m = MfccExtractor::default()
            .extract(&Waveform::new(Vec::new(), 22_050))
            .unwrap();
        assert_eq!(m.dim(), (13, 0));
    }

    #[test]
    fn test_mfcc_rejects_zero_rate() {
        let err = MfccExtractor::default()
            .extract(&Waveform::new(vec![0.0; 10], 0))
            .unwrap_err();
        assert!(matches!(err, FeatureError::InvalidSampleRate(0)));
    }
}
