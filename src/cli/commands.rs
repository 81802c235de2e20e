use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use confsync::pipeline::{Pipeline, PipelineConfig, ProjectReport};
use confsync::sample::SampleFilter;

use crate::error::Result;

use super::report::{render_json, render_text};

#[derive(Parser)]
#[command(name = "confsync")]
#[command(about = "Extract configuration parameters from OpenStack sample configs and map them to Puppet manifests")]
#[command(version)]
#[command(after_long_help = r#"
EXAMPLES:
    # Clone nova and puppet-nova into ./work, generate samples and report
    confsync --project nova --workdir ./work

    # Reuse existing checkouts and samples, only parse nova.conf.sample
    confsync --project nova --workdir ./work --no-git-clone --no-tox --no-bundle \
        --conf-sample nova.conf.sample

    # JSON report
    confsync --project glance --format json

NOTES:
    Sample files are rewritten in place. Do not run two instances against the
    same workdir at the same time.
"#)]
pub struct Cli {
    /// OpenStack project name
    #[arg(long)]
    pub project: String,

    /// OpenStack project git url
    #[arg(long, alias = "project_url")]
    pub project_url: Option<String>,

    /// Puppet OpenStack project name (default: puppet-<project>)
    #[arg(long, alias = "puppet_project")]
    pub puppet_project: Option<String>,

    /// Puppet OpenStack project git url
    #[arg(long, alias = "puppet_project_url")]
    pub puppet_project_url: Option<String>,

    /// Directory where projects are cloned (default: current dir)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Don't clone project repos; use existing checkouts in the workdir
    #[arg(long)]
    pub no_git_clone: bool,

    /// Don't run `tox -e genconfig`
    #[arg(long)]
    pub no_tox: bool,

    /// Don't run `bundle install` for puppet-strings
    #[arg(long)]
    pub no_bundle: bool,

    /// Don't cross-reference sections with the Puppet manifests
    #[arg(long)]
    pub skip_manifests: bool,

    /// Name of the sample file to report, e.g. glance-api.conf.sample
    #[arg(long, alias = "conf_sample")]
    pub conf_sample: Option<String>,

    /// Fail when --conf-sample matches no sample file
    #[arg(long)]
    pub strict_sample: bool,

    /// Timeout for each external command, in seconds
    #[arg(long, default_value = "1800")]
    pub timeout: u64,

    /// Output format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

impl Cli {
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let workdir = match &self.workdir {
            Some(dir) => dir.clone(),
            None => {
                info!("No workdir set, using current dir");
                std::env::current_dir()?
            }
        };

        Ok(PipelineConfig {
            project: self.project.clone(),
            project_url: self.project_url.clone(),
            puppet_project: self.puppet_project.clone(),
            puppet_project_url: self.puppet_project_url.clone(),
            workdir,
            clone: !self.no_git_clone,
            generate_samples: !self.no_tox,
            bootstrap_docs: !self.no_bundle,
            cross_reference: !self.skip_manifests,
            conf_sample: self.conf_sample.clone(),
            sample_filter: if self.strict_sample {
                SampleFilter::Strict
            } else {
                SampleFilter::Passthrough
            },
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

/// Run the pipeline and print the report to stdout.
pub async fn run(cli: &Cli) -> Result<ProjectReport> {
    let pipeline = Pipeline::new(cli.pipeline_config()?);
    let report = pipeline.run().await?;

    let rendered = match cli.format.as_str() {
        "json" => render_json(&report)?,
        _ => render_text(&report),
    };
    print!("{}", rendered);

    Ok(report)
}
