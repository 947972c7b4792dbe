use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use featurize::config::{
    DEFAULT_AUDIO_DIR, DEFAULT_AUDIO_EXTENSION, DEFAULT_FIXED_TIMESTEPS, DEFAULT_MANIFEST,
    DEFAULT_SET,
};
use featurize::data::ManifestQuery;
use featurize::features::extractor_for;
use featurize::progress::ConsoleReporter;
use featurize::{FeatureKind, PipelineConfig};

/// Which feature pipelines to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    Cqt,
    Mfcc,
    /// CQT, then MFCC
    All,
}

impl Target {
    fn kinds(self) -> &'static [FeatureKind] {
        match self {
            Target::Cqt => &[FeatureKind::Cqt],
            Target::Mfcc => &[FeatureKind::Mfcc],
            Target::All => &[FeatureKind::Cqt, FeatureKind::Mfcc],
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "featurize")]
#[command(about = "Convert manifest-listed audio files into fixed-size CQT / MFCC .npy arrays")]
#[command(version)]
struct Args {
    /// Feature pipeline(s) to run
    #[arg(value_enum)]
    target: Target,

    /// Manifest file (.csv, .json or .parquet)
    #[arg(long, default_value = DEFAULT_MANIFEST, env = "FEATURIZE_MANIFEST")]
    manifest: PathBuf,

    /// Manifest column holding the audio identifier
    #[arg(long, default_value = "Name", env = "FEATURIZE_IDENTIFIER_COLUMN")]
    identifier_column: String,

    /// Manifest column compared against --set
    #[arg(long, default_value = "Set", env = "FEATURIZE_FILTER_COLUMN")]
    filter_column: String,

    /// Only rows whose filter column equals this value are processed
    #[arg(long = "set", default_value = DEFAULT_SET, env = "FEATURIZE_SET")]
    filter_value: String,

    /// Manifest column rows are sorted by
    #[arg(long, default_value = "Name", env = "FEATURIZE_SORT_COLUMN")]
    sort_column: String,

    /// Number of time frames every output is padded or truncated to
    #[arg(long, default_value_t = DEFAULT_FIXED_TIMESTEPS, env = "FEATURIZE_TIMESTEPS")]
    timesteps: usize,

    /// Directory containing the audio files
    #[arg(long, default_value = DEFAULT_AUDIO_DIR, env = "FEATURIZE_AUDIO_DIR")]
    audio_dir: PathBuf,

    /// Audio file extension appended to each identifier
    #[arg(long, default_value = DEFAULT_AUDIO_EXTENSION, env = "FEATURIZE_AUDIO_EXT")]
    audio_ext: String,

    /// Output directory (defaults to cqts/ or mfccs/; ignored with `all`)
    #[arg(long, env = "FEATURIZE_OUT_DIR")]
    out_dir: Option<PathBuf>,

    /// Worker threads; 1 processes in manifest order
    #[arg(short, long, default_value_t = 1, env = "FEATURIZE_JOBS")]
    jobs: usize,
}

impl Args {
    fn config_for(&self, kind: FeatureKind) -> PipelineConfig {
        let output_dir = match (&self.out_dir, self.target) {
            (Some(dir), Target::Cqt | Target::Mfcc) => dir.clone(),
            _ => PathBuf::from(kind.default_output_dir()),
        };
        PipelineConfig {
            manifest: self.manifest.clone(),
            query: ManifestQuery {
                identifier_column: self.identifier_column.clone(),
                filter_column: self.filter_column.clone(),
                filter_value: self.filter_value.clone(),
                sort_column: self.sort_column.clone(),
            },
            audio_dir: self.audio_dir.clone(),
            audio_extension: self.audio_ext.trim_start_matches('.').to_string(),
            output_dir,
            fixed_timesteps: self.timesteps,
            jobs: self.jobs.max(1),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.out_dir.is_some() && args.target == Target::All {
        log::warn!("--out-dir is ignored with `all`; using cqts/ and mfccs/");
    }

    for &kind in args.target.kinds() {
        let config = args.config_for(kind);
        log::debug!("{kind} config: {}", serde_json::to_string(&config)?);
        let extractor = extractor_for(kind);
        let reporter = ConsoleReporter::stdout(kind);

        let summary = featurize::run(&config, extractor.as_ref(), &reporter)?;
        log::info!(
            "{kind} done: {} file(s) in {}",
            summary.processed,
            summary.output_dir.display()
        );
    }

    Ok(())
}
