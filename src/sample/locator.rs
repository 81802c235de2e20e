//! Finds generated sample files in a project checkout.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfsyncError, Result};

/// Location of generated samples, relative to the checkout root.
pub const SAMPLE_GLOB: &str = "etc/*.sample";

/// Substring a sample's file name must contain to count as a config sample.
const CONF_MARKER: &str = "conf";

/// Return every `etc/*.sample` file in the checkout, unfiltered.
pub fn locate_samples(checkout: &Path) -> Result<Vec<PathBuf>> {
    // The checkout path is literal; only the sample part is a pattern.
    let escaped = glob::Pattern::escape(&checkout.to_string_lossy());
    let pattern = Path::new(&escaped).join(SAMPLE_GLOB);
    let pattern = pattern.to_string_lossy();
    debug!(pattern = %pattern, "Looking for sample files");

    let mut samples = Vec::new();
    for entry in glob::glob(&pattern)? {
        match entry {
            Ok(path) if path.is_file() => samples.push(path),
            Ok(_) => {}
            Err(e) => return Err(ConfsyncError::Io(e.into_error())),
        }
    }

    Ok(samples)
}

/// Keep only samples whose file name contains `conf`, dropping
/// `.json.sample`, `.yaml.sample` and similar formats.
pub fn filter_conf_samples(samples: Vec<PathBuf>) -> Vec<PathBuf> {
    samples
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().contains(CONF_MARKER))
                .unwrap_or(false)
        })
        .collect()
}

/// Locate and filter in one step. An empty result is reported as
/// [`ConfsyncError::NoSamples`], never as an empty success.
pub fn find_conf_samples(checkout: &Path) -> Result<Vec<PathBuf>> {
    let all = locate_samples(checkout)?;
    let total = all.len();
    let samples = filter_conf_samples(all);

    info!(
        found = total,
        kept = samples.len(),
        dir = %checkout.display(),
        "Located sample files"
    );

    if samples.is_empty() {
        return Err(ConfsyncError::NoSamples {
            dir: checkout.join("etc"),
        });
    }

    Ok(samples)
}
