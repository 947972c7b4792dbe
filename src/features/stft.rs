//! Centred framing and short-time power spectra.
//!
//! Frame t is centred on sample t * hop, with zeros outside the signal.

use ndarray::Array2;
use realfft::RealFftPlanner;

use super::FeatureError;

/// Number of centred frames for a signal: `1 + len / hop`, or 0 when empty.
pub fn frame_count(len: usize, hop: usize) -> usize {
    if len == 0 || hop == 0 {
        return 0;
    }
    1 + len / hop
}

/// Copy the `buf.len()` samples centred on `center` into `buf`,
/// zero-filling whatever falls outside the signal.
pub fn fill_centered_frame(samples: &[f32], center: usize, buf: &mut [f32]) {
    let half = buf.len() / 2;
    for (j, slot) in buf.iter_mut().enumerate() {
        // index = center - half + j, computed without underflow
        let idx = (center + j).checked_sub(half);
        *slot = match idx {
            Some(i) if i < samples.len() => samples[i],
            _ => 0.0,
        };
    }
}

/// Periodic Hann window (the FFT-friendly variant).
pub fn hann_window(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos())
        .map(|w| w as f32)
        .collect()
}

/// |STFT|² with a periodic Hann window, shape `(n_fft / 2 + 1, frames)`.
pub fn power_spectrogram(
    samples: &[f32],
    n_fft: usize,
    hop: usize,
) -> Result<Array2<f32>, FeatureError> {
    let n_bins = n_fft / 2 + 1;
    let n_frames = frame_count(samples.len(), hop);
    let mut spec = Array2::<f32>::zeros((n_bins, n_frames));
    if n_frames == 0 {
        return Ok(spec);
    }

    let window = hann_window(n_fft);
    let mut planner = RealFftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);
    let mut frame = fft.make_input_vec();
    let mut spectrum = fft.make_output_vec();

    for t in 0..n_frames {
        fill_centered_frame(samples, t * hop, &mut frame);
        for (x, w) in frame.iter_mut().zip(&window) {
            *x *= w;
        }
        fft.process(&mut frame, &mut spectrum)
            .map_err(|e| FeatureError::Fft(e.to_string()))?;
        for (f, c) in spectrum.iter().enumerate() {
            spec[[f, t]] = c.norm_sqr();
        }
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(0, 512), 0);
        assert_eq!(frame_count(1, 512), 1);
        assert_eq!(frame_count(512, 512), 2);
        assert_eq!(frame_count(22_050, 512), 44);
    }

    #[test]
    fn test_fill_centered_frame_pads_edges() {
        let samples = [1.0, 2.0, 3.0];
        let mut buf = [9.0; 4];
        fill_centered_frame(&samples, 0, &mut buf);
        assert_eq!(buf, [0.0, 0.0, 1.0, 2.0]);

        fill_centered_frame(&samples, 2, &mut buf);
        assert_eq!(buf, [1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_hann_window_periodic() {
        let w = hann_window(4);
        assert!((w[0] - 0.0).abs() < 1e-7);
        assert!((w[1] - 0.5).abs() < 1e-7);
        assert!((w[2] - 1.0).abs() < 1e-7);
        assert!((w[3] - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_power_spectrogram_peak_bin() {
        let sr = 8000.0;
        let n_fft = 256;
        // 1 kHz lands exactly on bin 32
        let samples: Vec<f32> = (0..4000)
            .map(|i| (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr).sin())
            .collect();
        let spec = power_spectrogram(&samples, n_fft, 64).unwrap();
        assert_eq!(spec.dim(), (129, frame_count(4000, 64)));

        let mid = spec.column(spec.ncols() / 2);
        let peak = mid
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 32);
    }

    #[test]
    fn test_power_spectrogram_empty() {
        let spec = power_spectrogram(&[], 2048, 512).unwrap();
        assert_eq!(spec.dim(), (1025, 0));
    }
}
