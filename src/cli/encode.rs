use std::sync::Arc;

use anyhow::Result;
use indicatif::MultiProgress;
use wavenc::codec::lame::LameEncoderFactory;
use wavenc::process::pipeline::{Pipeline, PipelineConfig, Progress};

use super::command::Cli;
use super::progress::create_progress_bar;
use super::report::RunReport;
use crate::input::discover_wav_files;
use crate::timestamp::time_str;

pub fn cmd_encode(cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let sources = discover_wav_files(&cli.folder)?;
    if sources.is_empty() {
        anyhow::bail!("No .wav files found in {}", cli.folder.display());
    }

    let workers = cli.workers();
    log::info!(
        "Found {} WAV file(s) in {} (workers: {workers}, quality: {})",
        sources.len(),
        cli.folder.display(),
        cli.quality
    );

    let mut config = PipelineConfig::new(workers);
    if let Some(dir) = &cli.output_dir {
        log::info!("Output directory specified: {}", dir.display());
        config = config.with_output_dir(dir);
    }

    let pipeline = Pipeline::new(config, Arc::new(LameEncoderFactory::new(cli.quality)));

    let pb = match multi {
        Some(multi) => Some(create_progress_bar(multi, sources.len() as u64)?),
        None => None,
    };
    let on_progress = |done: usize, total: usize| {
        if let Some(ref pb) = pb {
            pb.set_position(done as u64);
            pb.set_message(format!("{} remaining", total - done));
        }
    };
    let progress: Option<Progress<'_>> = pb.as_ref().map(|_| &on_progress as Progress<'_>);

    let summary = match pipeline.run(sources, progress) {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(ref pb) = pb {
                pb.abandon_with_message("conversion failed");
            }
            return Err(e.into());
        }
    };

    let elapsed = time_str(summary.elapsed.as_secs_f64());
    if let Some(ref pb) = pb {
        pb.finish_with_message(format!("done in {elapsed}"));
    }

    log::info!(
        "Processed {} file(s): {} chunk(s) encoded, {} failed, {} unreadable, {} without audio, {} skipped ({elapsed})",
        summary.files_discovered,
        summary.chunks_encoded,
        summary.chunks_failed,
        summary.files_unreadable,
        summary.files_without_chunks,
        summary.files_not_dispatched,
    );

    if let Some(path) = &cli.report {
        RunReport::new(
            &cli.folder,
            cli.output_dir.as_deref(),
            workers,
            cli.quality,
            &summary,
        )
        .write(path)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}
