use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const SAMPLE_RATE: u32 = 22_050;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A short chord of partials with a decaying envelope plus light noise.
fn synthesize(partials: &[f64], seconds: f64, rng: &mut SimpleRng) -> Vec<i16> {
    let n = (seconds * SAMPLE_RATE as f64) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE as f64;
            let envelope = (-1.5 * t).exp();
            let tone: f64 = partials
                .iter()
                .map(|&f| (2.0 * std::f64::consts::PI * f * t).sin())
                .sum::<f64>()
                / partials.len() as f64;
            let sample = 0.6 * envelope * tone + rng.gauss(0.0, 0.01);
            (sample.clamp(-1.0, 1.0) * i16::MAX as f64) as i16
        })
        .collect()
}

fn write_wav(path: &Path, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("creating {}", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

fn main() -> Result<()> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let audio_dir = root.join("audio");
    for dir in [&audio_dir, &root.join("cqts"), &root.join("mfccs")] {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut rng = SimpleRng::new(42);

    // (name, set, partials in Hz, duration in seconds)
    let clips: [(&str, &str, &[f64], f64); 6] = [
        ("clip_c_major", "progress", &[261.63, 329.63, 392.0], 2.5),
        ("clip_a_minor", "train", &[220.0, 261.63, 329.63], 4.0),
        ("clip_g_major", "progress", &[196.0, 246.94, 293.66], 4.5),
        ("clip_short_a4", "progress", &[440.0], 0.8),
        ("clip_e_minor", "train", &[164.81, 196.0, 246.94], 3.0),
        ("clip_d_major", "progress", &[293.66, 369.99, 440.0], 3.5),
    ];

    let mut manifest = csv::Writer::from_path(root.join("files.csv"))?;
    manifest.write_record(["Name", "Set"])?;
    for (name, set, partials, seconds) in clips {
        let samples = synthesize(partials, seconds, &mut rng);
        write_wav(&audio_dir.join(format!("{name}.wav")), &samples)?;
        manifest.write_record([name, set])?;
    }
    manifest.flush()?;

    println!(
        "Wrote {} clips and files.csv to {}\n\
         Try: cd {} && featurize all --audio-dir audio --audio-ext wav",
        clips.len(),
        root.display(),
        root.display()
    );
    Ok(())
}
