//! Runs normalization and extraction over every sample of a project.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ConfsyncError, Result};

use super::{extract_parameters, normalize_file, ProjectParameterSet};

/// What to do with a `--conf-sample` name that matches none of the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFilter {
    /// Ignore an unmatched name and keep every sample.
    #[default]
    Passthrough,
    /// Report an unmatched name as an error.
    Strict,
}

/// A sample that could not be processed.
#[derive(Debug, Clone, Serialize)]
pub struct SampleFailure {
    pub sample: String,
    pub path: PathBuf,
    pub error: String,
}

/// Overall outcome of processing a sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every sample parsed.
    Complete,
    /// Some samples parsed, some failed.
    Degraded,
    /// No sample parsed.
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Degraded => "degraded",
            RunStatus::Failed => "failed",
        }
    }
}

/// Parameters of every sample that parsed, plus the ones that did not.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SampleSetReport {
    pub parameters: ProjectParameterSet,
    pub failures: Vec<SampleFailure>,
}

impl SampleSetReport {
    pub fn succeeded(&self) -> usize {
        self.parameters.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn status(&self) -> RunStatus {
        match (self.succeeded(), self.failed()) {
            (_, 0) => RunStatus::Complete,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::Degraded,
        }
    }

    /// Narrow the set to a single sample. An unmatched name either keeps the
    /// whole set or fails, depending on `mode`.
    pub fn narrow_to(&mut self, sample: &str, mode: SampleFilter) -> Result<()> {
        match self.parameters.remove_entry(sample) {
            Some((name, params)) => {
                self.parameters.clear();
                self.parameters.insert(name, params);
                self.failures.retain(|f| f.sample == sample);
                Ok(())
            }
            None if self.failures.iter().any(|f| f.sample == sample) => {
                self.failures.retain(|f| f.sample == sample);
                self.parameters.clear();
                Ok(())
            }
            None => match mode {
                SampleFilter::Passthrough => {
                    warn!(sample, "Requested sample not found, keeping all samples");
                    Ok(())
                }
                SampleFilter::Strict => Err(ConfsyncError::SampleNotFound(sample.to_string())),
            },
        }
    }
}

fn sample_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Normalize and parse every sample, keyed by file base name. A sample that
/// fails is recorded in [`SampleSetReport::failures`] and the rest continue.
pub fn aggregate(
    samples: &[PathBuf],
    only: Option<&str>,
    mode: SampleFilter,
) -> Result<SampleSetReport> {
    let mut report = SampleSetReport::default();

    for path in samples {
        let name = sample_name(path);

        let result = normalize_file(path).and_then(|()| extract_parameters(path));
        match result {
            Ok(params) => {
                info!(sample = %name, sections = params.len(), "Parsed sample");
                report.parameters.insert(name, params);
            }
            Err(e) => {
                warn!(sample = %name, error = %e, "Failed to parse sample");
                report.failures.push(SampleFailure {
                    sample: name,
                    path: path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if let Some(only) = only {
        report.narrow_to(only, mode)?;
    }

    info!(
        ok = report.succeeded(),
        failed = report.failed(),
        status = report.status().as_str(),
        "Processed sample files"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sample(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn two_samples(dir: &Path) -> Vec<PathBuf> {
        vec![
            write_sample(dir, "bar.conf.sample", "[DEFAULT]\n#debug = false\n"),
            write_sample(dir, "other.conf.sample", "[api]\n# help text\n#port = 80\n"),
        ]
    }

    #[test]
    fn test_aggregate_keys_by_basename() {
        let temp_dir = TempDir::new().unwrap();
        let samples = two_samples(temp_dir.path());

        let report = aggregate(&samples, None, SampleFilter::Passthrough).unwrap();

        assert_eq!(report.parameters.len(), 2);
        assert_eq!(report.parameters["bar.conf.sample"]["DEFAULT"]["debug"], "false");
        assert_eq!(report.parameters["other.conf.sample"]["api"]["port"], "80");
        assert_eq!(report.status(), RunStatus::Complete);
    }

    #[test]
    fn test_filter_narrows_to_one() {
        let temp_dir = TempDir::new().unwrap();
        let samples = two_samples(temp_dir.path());

        let report =
            aggregate(&samples, Some("bar.conf.sample"), SampleFilter::Passthrough).unwrap();

        assert_eq!(report.parameters.len(), 1);
        assert!(report.parameters.contains_key("bar.conf.sample"));
    }

    #[test]
    fn test_unmatched_filter_passes_through() {
        let temp_dir = TempDir::new().unwrap();
        let samples = two_samples(temp_dir.path());

        let report =
            aggregate(&samples, Some("missing.conf.sample"), SampleFilter::Passthrough).unwrap();

        assert_eq!(report.parameters.len(), 2);
    }

    #[test]
    fn test_unmatched_filter_strict_fails() {
        let temp_dir = TempDir::new().unwrap();
        let samples = two_samples(temp_dir.path());

        let err = aggregate(&samples, Some("missing.conf.sample"), SampleFilter::Strict)
            .unwrap_err();
        assert!(matches!(err, ConfsyncError::SampleNotFound(name) if name == "missing.conf.sample"));
    }

    #[test]
    fn test_failure_degrades_instead_of_aborting() {
        let temp_dir = TempDir::new().unwrap();
        let mut samples = two_samples(temp_dir.path());
        samples.push(write_sample(
            temp_dir.path(),
            "broken.conf.sample",
            "orphan = 1\n[DEFAULT]\n",
        ));

        let report = aggregate(&samples, None, SampleFilter::Passthrough).unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].sample, "broken.conf.sample");
        assert!(report.failures[0].error.contains("broken.conf.sample:1"));
        assert_eq!(report.status(), RunStatus::Degraded);
    }

    #[test]
    fn test_all_failed() {
        let temp_dir = TempDir::new().unwrap();
        let samples = vec![write_sample(temp_dir.path(), "x.conf.sample", "nonsense\n")];

        let report = aggregate(&samples, None, SampleFilter::Passthrough).unwrap();
        assert_eq!(report.status(), RunStatus::Failed);
    }

    #[test]
    fn test_narrow_to_existing_entry() {
        let mut report = SampleSetReport::default();
        report
            .parameters
            .insert("bar.conf.sample".to_string(), Default::default());
        report
            .parameters
            .insert("other.conf.sample".to_string(), Default::default());

        report
            .narrow_to("bar.conf.sample", SampleFilter::Passthrough)
            .unwrap();

        assert_eq!(
            report.parameters.keys().collect::<Vec<_>>(),
            vec!["bar.conf.sample"]
        );
    }
}
