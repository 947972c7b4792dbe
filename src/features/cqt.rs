//! Constant-Q transform.
//!
//! Single-resolution spectral-kernel CQT: every bin's windowed complex
//! exponential is transformed once into a sparse frequency-domain kernel,
//! then each centred frame's spectrum is correlated against it.

use ndarray::Array2;
use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::db::{amplitude_to_db, DbReference};
use super::stft::{fill_centered_frame, frame_count, hann_window};
use super::{FeatureError, FeatureExtractor, FeatureMatrix};
use crate::audio::Waveform;
use crate::config::FeatureKind;

/// Frequency of C1 in Hz.
pub const C1_HZ: f64 = 32.703_195_662_574_764;

/// Equivalent noise bandwidth of the Hann window, in FFT bins.
const HANN_BANDWIDTH: f64 = 1.500_183_105_468_75;

/// CQT parameters. Defaults: 84 bins (7 octaves) from C1, 12 per octave,
/// hop 512, magnitudes in dB relative to the matrix peak.
#[derive(Debug, Clone)]
pub struct CqtConfig {
    pub hop_length: usize,
    pub fmin: f64,
    pub n_bins: usize,
    pub bins_per_octave: usize,
    /// Multiplier on the filter length; 1.0 gives exactly one bin of resolution.
    pub filter_scale: f64,
    /// Fraction of each kernel's L1 mass dropped as near-zero taps.
    pub sparsity: f64,
    pub reference: DbReference,
    pub amin: f32,
}

impl Default for CqtConfig {
    fn default() -> Self {
        CqtConfig {
            hop_length: 512,
            fmin: C1_HZ,
            n_bins: 84,
            bins_per_octave: 12,
            filter_scale: 1.0,
            sparsity: 0.01,
            reference: DbReference::Max,
            amin: 1e-5,
        }
    }
}

impl CqtConfig {
    /// Quality factor shared by every bin.
    pub fn q(&self) -> f64 {
        self.filter_scale / (2f64.powf(1.0 / self.bins_per_octave as f64) - 1.0)
    }

    /// Centre frequency of bin `k`.
    pub fn bin_frequency(&self, k: usize) -> f64 {
        self.fmin * 2f64.powf(k as f64 / self.bins_per_octave as f64)
    }
}

/// One bin's sparse frequency-domain kernel.
#[derive(Debug, Clone)]
struct KernelRow {
    taps: Vec<(usize, Complex<f32>)>,
    /// Time-domain filter length in samples (fractional).
    length: f64,
}

#[derive(Debug, Clone)]
struct SpectralKernel {
    fft_len: usize,
    rows: Vec<KernelRow>,
}

#[derive(Debug, Clone, Default)]
pub struct CqtExtractor {
    pub config: CqtConfig,
}

impl CqtExtractor {
    pub fn new(config: CqtConfig) -> Self {
        Self { config }
    }

    fn build_kernel(&self, sample_rate: f64) -> Result<SpectralKernel, FeatureError> {
        let cfg = &self.config;
        if cfg.n_bins == 0 || cfg.bins_per_octave == 0 || cfg.fmin <= 0.0 {
            return Err(FeatureError::InvalidConfig(
                "CQT needs n_bins, bins_per_octave and fmin > 0".into(),
            ));
        }

        let q = cfg.q();
        let highest = cfg.bin_frequency(cfg.n_bins - 1);
        let nyquist = sample_rate / 2.0;
        if highest * (1.0 + 0.5 * HANN_BANDWIDTH / q) > nyquist {
            return Err(FeatureError::NyquistExceeded {
                highest_hz: highest,
                nyquist_hz: nyquist,
            });
        }

        let lengths: Vec<f64> = (0..cfg.n_bins)
            .map(|k| q * sample_rate / cfg.bin_frequency(k))
            .collect();
        let fft_len = (lengths[0].ceil() as usize).next_power_of_two();
        let n_spec = fft_len / 2 + 1;

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(fft_len);
        let mut buffer = vec![Complex::new(0.0f64, 0.0); fft_len];

        let mut rows = Vec::with_capacity(cfg.n_bins);
        for (k, &length) in lengths.iter().enumerate() {
            let freq = cfg.bin_frequency(k);
            let n = (length.ceil() as usize).clamp(1, fft_len);
            let window = hann_window(n);
            let l1: f64 = window.iter().map(|&w| w as f64).sum::<f64>().max(f64::MIN_POSITIVE);
            let gain = length / fft_len as f64 / l1;

            buffer.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
            let start = (fft_len - n) / 2;
            for (j, &w) in window.iter().enumerate() {
                let t = j as f64 - n as f64 / 2.0;
                let phase = 2.0 * std::f64::consts::PI * freq * t / sample_rate;
                buffer[start + j] = Complex::from_polar(w as f64 * gain, phase);
            }
            fft.process(&mut buffer);

            let spectrum: Vec<Complex<f64>> = buffer[..n_spec].iter().map(|c| c.conj()).collect();
            rows.push(KernelRow {
                taps: sparsify(&spectrum, cfg.sparsity),
                length,
            });
        }

        Ok(SpectralKernel { fft_len, rows })
    }

    /// Linear CQT magnitudes, shape `(n_bins, 1 + len / hop)`.
    pub fn magnitude(&self, waveform: &Waveform) -> Result<Array2<f32>, FeatureError> {
        if waveform.sample_rate == 0 {
            return Err(FeatureError::InvalidSampleRate(waveform.sample_rate));
        }
        let cfg = &self.config;
        let kernel = self.build_kernel(waveform.sample_rate as f64)?;
        let n_frames = frame_count(waveform.samples.len(), cfg.hop_length);
        let mut out = Array2::<f32>::zeros((cfg.n_bins, n_frames));
        if n_frames == 0 {
            return Ok(out);
        }

        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(kernel.fft_len);
        let mut frame = fft.make_input_vec();
        let mut spectrum = fft.make_output_vec();

        for t in 0..n_frames {
            fill_centered_frame(&waveform.samples, t * cfg.hop_length, &mut frame);
            fft.process(&mut frame, &mut spectrum)
                .map_err(|e| FeatureError::Fft(e.to_string()))?;

            for (k, row) in kernel.rows.iter().enumerate() {
                let response: Complex<f32> = row
                    .taps
                    .iter()
                    .map(|&(f, tap)| spectrum[f] * tap)
                    .sum();
                out[[k, t]] = response.norm() / (row.length.sqrt() as f32);
            }
        }

        Ok(out)
    }
}

impl FeatureExtractor for CqtExtractor {
    fn kind(&self) -> FeatureKind {
        FeatureKind::Cqt
    }

    /// |CQT| in dB, shape `(n_bins, T)`.
    fn extract(&self, waveform: &Waveform) -> Result<FeatureMatrix, FeatureError> {
        let magnitude = self.magnitude(waveform)?;
        Ok(amplitude_to_db(&magnitude, self.config.reference, self.config.amin))
    }
}

/// Drop the smallest taps whose combined magnitude stays under
/// `quantile` of the row's L1 norm.
fn sparsify(row: &[Complex<f64>], quantile: f64) -> Vec<(usize, Complex<f32>)> {
    let mags: Vec<f64> = row.iter().map(|c| c.norm()).collect();
    let total: f64 = mags.iter().sum();

    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| mags[a].total_cmp(&mags[b]));

    let mut keep = vec![true; row.len()];
    let mut dropped = 0.0;
    for &i in &order {
        dropped += mags[i];
        if dropped >= quantile * total {
            break;
        }
        keep[i] = false;
    }

    row.iter()
        .enumerate()
        .filter(|&(i, _)| keep[i])
        .map(|(i, c)| (i, Complex::new(c.re as f32, c.im as f32)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sr: u32, secs: f64) -> Waveform {
        let n = (sr as f64 * secs) as usize;
        let samples = (0..n)
            .map(|i| (0.5 * (2.0 * std::f64::consts::PI * freq * i as f64 / sr as f64).sin()) as f32)
            .collect();
        Waveform::new(samples, sr)
    }

    #[test]
    fn test_cqt_shape_and_peak_reference() {
        let wave = sine(440.0, 22_050, 1.0);
        let db = CqtExtractor::default().extract(&wave).unwrap();
        assert_eq!(db.dim(), (84, 1 + 22_050 / 512));

        let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert!(peak.abs() < 1e-4);
        assert!(db.iter().all(|&v| v >= -80.0 - 1e-3));
    }

    #[test]
    fn test_cqt_a4_lands_on_bin_45() {
        // A4 is 45 semitones above C1
        let wave = sine(440.0, 22_050, 1.0);
        let mag = CqtExtractor::default().magnitude(&wave).unwrap();
        let mid = mag.column(mag.ncols() / 2);
        let peak = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 45);
    }

    #[test]
    fn test_cqt_nyquist_exceeded() {
        let wave = sine(100.0, 4000, 0.1);
        let err = CqtExtractor::default().extract(&wave).unwrap_err();
        assert!(matches!(err, FeatureError::NyquistExceeded { .. }));
    }

    #[test]
    fn test_cqt_empty_waveform() {
        let db = CqtExtractor::default()
            .extract(&Waveform::new(Vec::new(), 22_050))
            .unwrap();
        assert_eq!(db.dim(), (84, 0));
    }

    #[test]
    fn test_sparsify_keeps_dominant_taps() {
        let row: Vec<Complex<f64>> = [0.001, 5.0, 0.002, 4.0, 0.0]
            .iter()
            .map(|&m| Complex::new(m, 0.0))
            .collect();
        let taps = sparsify(&row, 0.01);
        let kept: Vec<usize> = taps.iter().map(|&(i, _)| i).collect();
        assert_eq!(kept, vec![1, 3]);
    }
}
