//! Orchestration of a single project run.
//!
//! checkout -> (puppet module checkout) -> (documentation tool bootstrap)
//! -> sample generation -> locate -> normalize/extract -> cross-reference.
//!
//! Checkout of the service project, sample generation and "no samples" halt
//! the run. Everything after that degrades the report instead.
//!
//! Runs sharing a workdir must not overlap: clones and sample rewrites are not
//! locked.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::git::{CheckoutProvider, CheckoutRequest, ExistingCheckout, GitCheckout};
use crate::manifest::{ManifestCrossReferencer, ManifestReport};
use crate::process::DEFAULT_TIMEOUT;
use crate::sample::{aggregate, find_conf_samples, SampleFilter, SampleSetReport};
use crate::tooling::{
    BundleInstall, SampleGenerator, ToxGenconfig, PUPPET_STRINGS_PROJECT, PUPPET_STRINGS_URL,
};

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub project: String,
    pub project_url: Option<String>,
    /// Defaults to `puppet-<project>`.
    pub puppet_project: Option<String>,
    pub puppet_project_url: Option<String>,
    pub workdir: PathBuf,
    pub clone: bool,
    pub generate_samples: bool,
    pub bootstrap_docs: bool,
    pub cross_reference: bool,
    pub conf_sample: Option<String>,
    pub sample_filter: SampleFilter,
    pub timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            project_url: None,
            puppet_project: None,
            puppet_project_url: None,
            workdir: PathBuf::from("."),
            clone: true,
            generate_samples: true,
            bootstrap_docs: true,
            cross_reference: true,
            conf_sample: None,
            sample_filter: SampleFilter::Passthrough,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    pub fn new(project: impl Into<String>, workdir: impl AsRef<Path>) -> Self {
        Self {
            project: project.into(),
            workdir: workdir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    pub fn puppet_project(&self) -> String {
        self.puppet_project
            .clone()
            .unwrap_or_else(|| format!("puppet-{}", self.project))
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: String,
    pub puppet_project: String,
    pub samples: SampleSetReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifests: Option<ManifestReport>,
    /// Non-fatal problems hit along the way.
    pub warnings: Vec<String>,
}

pub struct Pipeline {
    config: PipelineConfig,
    checkout: Box<dyn CheckoutProvider>,
    generator: Box<dyn SampleGenerator>,
}

impl Pipeline {
    /// Pipeline backed by `git` and `tox`.
    pub fn new(config: PipelineConfig) -> Self {
        let checkout: Box<dyn CheckoutProvider> = if config.clone {
            Box::new(GitCheckout::with_timeout(config.timeout))
        } else {
            Box::new(ExistingCheckout)
        };
        let generator = Box::new(ToxGenconfig::new(config.timeout));
        Self::with_providers(config, checkout, generator)
    }

    pub fn with_providers(
        config: PipelineConfig,
        checkout: Box<dyn CheckoutProvider>,
        generator: Box<dyn SampleGenerator>,
    ) -> Self {
        Self {
            config,
            checkout,
            generator,
        }
    }

    pub async fn run(&self) -> Result<ProjectReport> {
        let config = &self.config;
        let puppet_project = config.puppet_project();
        let mut warnings = Vec::new();

        let project_dir = self
            .checkout
            .checkout(&CheckoutRequest::new(
                &config.project,
                config.project_url.clone(),
                &config.workdir,
            ))
            .await?;

        let puppet_dir = if config.cross_reference {
            let request = CheckoutRequest::new(
                &puppet_project,
                config.puppet_project_url.clone(),
                &config.workdir,
            );
            match self.checkout.checkout(&request).await {
                Ok(dir) => Some(dir),
                Err(e) => {
                    warn!(project = %puppet_project, error = %e, "Puppet module unavailable");
                    warnings.push(format!("{puppet_project}: {e}"));
                    None
                }
            }
        } else {
            None
        };

        if config.bootstrap_docs {
            if let Err(e) = self.bootstrap_docs().await {
                warn!(error = %e, "Documentation tool bootstrap failed");
                warnings.push(format!("{PUPPET_STRINGS_PROJECT}: {e}"));
            }
        }

        if config.generate_samples {
            self.generator.generate(&project_dir).await?;
        }

        let samples = find_conf_samples(&project_dir)?;
        let report = aggregate(&samples, config.conf_sample.as_deref(), config.sample_filter)?;

        for failure in &report.failures {
            warnings.push(format!("{}: {}", failure.sample, failure.error));
        }

        let manifests = match puppet_dir {
            Some(dir) => match ManifestCrossReferencer::new(&dir) {
                Ok(xref) => Some(xref.cross_reference(&report.parameters)),
                Err(e) => {
                    warn!(project = %puppet_project, error = %e, "Skipping manifest cross-reference");
                    warnings.push(format!("{puppet_project}: {e}"));
                    None
                }
            },
            None => None,
        };

        info!(
            project = %config.project,
            status = report.status().as_str(),
            warnings = warnings.len(),
            "Run finished"
        );

        Ok(ProjectReport {
            project: config.project.clone(),
            puppet_project,
            samples: report,
            manifests,
            warnings,
        })
    }

    async fn bootstrap_docs(&self) -> Result<()> {
        let request = CheckoutRequest::new(
            PUPPET_STRINGS_PROJECT,
            Some(PUPPET_STRINGS_URL.to_string()),
            &self.config.workdir,
        );
        let dir = self.checkout.checkout(&request).await?;
        BundleInstall::new(self.config.timeout).run(&dir).await
    }
}
