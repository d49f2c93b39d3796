use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

const WAV_EXTENSION: &str = ".wav";

/// Lists the `.wav` files directly inside `dir`, sorted by path.
///
/// Matching is on the file name suffix, case-insensitive, and needs at least
/// one character before it. Subdirectories are not searched.
pub fn discover_wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Can't open folder {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("Can't list folder {}", dir.display()))?;
        let path = entry.path();

        if !is_wav_name(&entry.file_name().to_string_lossy()) {
            continue;
        }
        match entry.file_type() {
            Ok(kind) if kind.is_dir() => {
                log::debug!("Skipping directory {}", path.display());
                continue;
            }
            Ok(_) => {}
            Err(e) => log::debug!("Can't stat {}: {e}", path.display()),
        }
        files.push(path);
    }

    files.sort();
    Ok(files)
}

fn is_wav_name(name: &str) -> bool {
    name.len() > WAV_EXTENSION.len()
        && name
            .get(name.len() - WAV_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(WAV_EXTENSION))
}
