//! Audio decoding
//!
//! Uses symphonia for format-agnostic decoding (FLAC, WAV, MP3, OGG, ...).
//! Samples are never resampled; all channels are averaged down to mono.

use std::path::Path;

use anyhow::{Context, Result, bail};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// A decoded mono signal.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    /// Mono samples, nominally in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Native sample rate in Hz
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to a mono [`Waveform`].
///
/// 1. Open the file and probe its container (extension used as a hint)
/// 2. Pick the first track with a known codec
/// 3. Decode every packet of that track, interleaved to f32
/// 4. Average channels into one mono stream
///
/// Fails if the file is missing, unreadable, has no audio track, a
/// packet cannot be decoded, or the stream asks for a decoder reset.
pub fn decode_file(path: &Path) -> Result<Waveform> {
    log::debug!("Decoding audio file {}", path.display());

    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", path.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    if sample_rate == 0 {
        bail!("Sample rate is zero");
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", path.display()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut channel_count = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(e) => {
                end_of_stream(e, samples.len())?;
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .with_context(|| format!("Failed to decode packet in: {}", path.display()))?;

        let spec = *decoded.spec();
        channel_count = spec.channels.count();
        if channel_count == 0 || decoded.frames() == 0 {
            continue;
        }

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        downmix_into(buffer.samples(), channel_count, &mut samples);
    }

    let waveform = Waveform::new(samples, sample_rate);
    log::debug!(
        "Decoded {}: {} Hz, {} channel(s), {} samples ({:.2}s)",
        path.display(),
        sample_rate,
        channel_count,
        waveform.samples.len(),
        waveform.duration_secs()
    );

    Ok(waveform)
}

/// Classify a packet-read error. A clean end of stream is `Ok`; anything
/// else, including a mid-stream decoder reset, fails the decode rather
/// than returning a truncated waveform.
fn end_of_stream(err: SymphoniaError, decoded_samples: usize) -> Result<()> {
    match err {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(()),
        SymphoniaError::ResetRequired => {
            log::warn!("Decoder reset required after {decoded_samples} samples");
            bail!("Stream changed mid-file (decoder reset required after {decoded_samples} samples)")
        }
        e => bail!("Error reading packet: {e}"),
    }
}

/// Average interleaved frames into mono samples, appending to `out`.
fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels == 1 {
        out.extend_from_slice(interleaved);
        return;
    }
    out.extend(
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: &[Vec<i16>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_file_not_found() {
        let result = decode_file(Path::new("/nonexistent/file.flac"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to open audio file"));
    }

    #[test]
    fn test_decode_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.flac");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(decode_file(&path).is_err());
    }

    #[test]
    fn test_decode_mono_wav_native_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let frames: Vec<Vec<i16>> = (0..2205).map(|i| vec![(i % 100) as i16 * 100]).collect();
        write_wav(&path, 1, 22_050, &frames);

        let wave = decode_file(&path).unwrap();
        assert_eq!(wave.sample_rate, 22_050);
        assert_eq!(wave.samples.len(), 2205);
        assert!((wave.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_decode_stereo_is_averaged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let frames: Vec<Vec<i16>> = (0..1000).map(|_| vec![16384, 0]).collect();
        write_wav(&path, 2, 8000, &frames);

        let wave = decode_file(&path).unwrap();
        assert_eq!(wave.samples.len(), 1000);
        // (0.5 + 0.0) / 2
        assert!(wave.samples.iter().all(|&s| (s - 0.25).abs() < 1e-3));
    }

    #[test]
    fn test_decode_flac_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/tone_a4_22050.flac");
        let wave = decode_file(&path).unwrap();

        assert_eq!(wave.sample_rate, 22_050);
        assert_eq!(wave.samples.len(), 11_025);
        assert!((wave.duration_secs() - 0.5).abs() < 1e-9);

        // 440 Hz sine at half scale, 16-bit
        for (i, &s) in wave.samples.iter().enumerate().step_by(97) {
            let phase = 2.0 * std::f64::consts::PI * 440.0 * i as f64 / 22_050.0;
            let expected = (0.5 * 32767.0 * phase.sin()).round() / 32768.0;
            assert!((s as f64 - expected).abs() < 1e-4, "sample {i}: {s} vs {expected}");
        }
    }

    #[test]
    fn test_end_of_stream_only_accepts_eof() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "end of stream");
        assert!(end_of_stream(SymphoniaError::IoError(eof), 10).is_ok());

        let err = end_of_stream(SymphoniaError::ResetRequired, 4096).unwrap_err();
        assert!(err.to_string().contains("after 4096 samples"));

        assert!(end_of_stream(SymphoniaError::DecodeError("bad frame"), 0).is_err());
    }

    #[test]
    fn test_downmix_into() {
        let mut out = Vec::new();
        downmix_into(&[0.1, 0.3, 0.5, 0.7], 2, &mut out);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.2).abs() < 1e-6);
        assert!((out[1] - 0.6).abs() < 1e-6);
    }
}
