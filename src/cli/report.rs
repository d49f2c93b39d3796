use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use wavenc::process::pipeline::RunSummary;

use crate::timestamp::time_str;

#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    tool: Tool,
    folder: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dir: Option<&'a Path>,
    workers: usize,
    quality: u8,
    files: FileCounts,
    chunks: ChunkCounts,
    elapsed: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    version: &'static str,
    library_version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    git_describe: Option<&'static str>,
}

#[derive(Debug, Serialize)]
struct FileCounts {
    discovered: usize,
    unreadable: usize,
    without_audio: usize,
    not_dispatched: usize,
}

#[derive(Debug, Serialize)]
struct ChunkCounts {
    encoded: usize,
    failed: usize,
}

impl<'a> RunReport<'a> {
    pub fn new(
        folder: &'a Path,
        output_dir: Option<&'a Path>,
        workers: usize,
        quality: u8,
        summary: &RunSummary,
    ) -> Self {
        Self {
            tool: Tool {
                name: env!("CARGO_PKG_NAME"),
                version: env!("CARGO_PKG_VERSION"),
                library_version: env!("WAVENC_VERSION"),
                git_describe: option_env!("VERGEN_GIT_DESCRIBE"),
            },
            folder,
            output_dir,
            workers,
            quality,
            files: FileCounts {
                discovered: summary.files_discovered,
                unreadable: summary.files_unreadable,
                without_audio: summary.files_without_chunks,
                not_dispatched: summary.files_not_dispatched,
            },
            chunks: ChunkCounts {
                encoded: summary.chunks_encoded,
                failed: summary.chunks_failed,
            },
            elapsed: time_str(summary.elapsed.as_secs_f64()),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_yaml()?)
            .with_context(|| format!("Can't write report {}", path.display()))
    }
}
