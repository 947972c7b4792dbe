//! manifest → (per identifier) decode → extract → pad/truncate → write → report

use std::path::PathBuf;

use rayon::prelude::*;

use crate::audio::decode_file;
use crate::config::PipelineConfig;
use crate::data::{load_manifest, select_identifiers};
use crate::error::PipelineError;
use crate::features::FeatureExtractor;
use crate::output::{artifact_path, write_artifact};
use crate::progress::ProgressReporter;
use crate::shape::pad_or_truncate;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Artifacts written, one per selected manifest row.
    pub processed: usize,
    pub output_dir: PathBuf,
}

/// Run one feature pipeline over every selected manifest row.
///
/// With `jobs <= 1` items are processed strictly in manifest order.
/// Otherwise a rayon pool of `jobs` threads is used and progress lines may
/// arrive out of order. Either way the first failure aborts the run;
/// artifacts already written are left in place.
pub fn run(
    config: &PipelineConfig,
    extractor: &dyn FeatureExtractor,
    reporter: &dyn ProgressReporter,
) -> Result<RunSummary, PipelineError> {
    let manifest = load_manifest(&config.manifest).map_err(|reason| PipelineError::DataLoad {
        path: config.manifest.clone(),
        reason,
    })?;
    let identifiers =
        select_identifiers(&manifest, &config.query).map_err(|reason| PipelineError::DataLoad {
            path: config.manifest.clone(),
            reason,
        })?;

    log::info!(
        "{}: {} of {} manifest rows selected ({} = {:?}) → {}",
        extractor.kind(),
        identifiers.len(),
        manifest.len(),
        config.query.filter_column,
        config.query.filter_value,
        config.output_dir.display()
    );
    if identifiers.is_empty() {
        log::warn!("No manifest rows matched; nothing to do");
    }

    if config.jobs <= 1 {
        for identifier in &identifiers {
            process_item(config, extractor, reporter, identifier)?;
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()?;
        pool.install(|| {
            identifiers
                .par_iter()
                .try_for_each(|identifier| process_item(config, extractor, reporter, identifier))
        })?;
    }

    log::info!(
        "{}: wrote {} artifact(s) to {}",
        extractor.kind(),
        identifiers.len(),
        config.output_dir.display()
    );

    Ok(RunSummary {
        processed: identifiers.len(),
        output_dir: config.output_dir.clone(),
    })
}

/// Decode, extract, normalize, write and report a single identifier.
pub fn process_item(
    config: &PipelineConfig,
    extractor: &dyn FeatureExtractor,
    reporter: &dyn ProgressReporter,
    identifier: &str,
) -> Result<(), PipelineError> {
    let audio_path = config.audio_path(identifier);
    let waveform = decode_file(&audio_path).map_err(|reason| PipelineError::AudioDecode {
        identifier: identifier.to_string(),
        path: audio_path.clone(),
        reason,
    })?;

    let features = extractor
        .extract(&waveform)
        .map_err(|source| PipelineError::Feature {
            identifier: identifier.to_string(),
            source,
        })?;
    log::debug!("{identifier}: raw {} shape {:?}", extractor.kind(), features.dim());

    let normalized = pad_or_truncate(features.view(), config.fixed_timesteps);

    let out_path = artifact_path(&config.output_dir, identifier);
    write_artifact(&out_path, &normalized).map_err(|source| PipelineError::Write {
        identifier: identifier.to_string(),
        path: out_path.clone(),
        source,
    })?;

    reporter.item_done(identifier, normalized.dim());
    Ok(())
}
