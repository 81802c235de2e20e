//! Project tooling invoked around the extraction: the sample generator of the
//! service project and the dependency bootstrap of the documentation tool.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{ConfsyncError, Result};
use crate::process::{CommandSpec, DEFAULT_TIMEOUT};

/// Repository of the Puppet documentation tool.
pub const PUPPET_STRINGS_PROJECT: &str = "puppet-strings";
pub const PUPPET_STRINGS_URL: &str = "https://github.com/puppetlabs/puppet-strings";

/// Populates `etc/*.sample` inside a project checkout.
#[async_trait]
pub trait SampleGenerator: Send + Sync {
    async fn generate(&self, checkout: &Path) -> Result<()>;
}

/// Runs `tox -e genconfig`.
pub struct ToxGenconfig {
    timeout: Duration,
}

impl ToxGenconfig {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn command(&self, checkout: &Path) -> CommandSpec {
        CommandSpec::new("tox")
            .args(["-e", "genconfig"])
            .current_dir(checkout)
            .timeout(self.timeout)
    }
}

impl Default for ToxGenconfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl SampleGenerator for ToxGenconfig {
    async fn generate(&self, checkout: &Path) -> Result<()> {
        let project = checkout
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| checkout.display().to_string());

        info!(project = %project, "Generating sample configuration");
        self.command(checkout)
            .run()
            .await
            .map(|_| ())
            .map_err(|e| ConfsyncError::SampleGeneration {
                project,
                source: Box::new(e),
            })
    }
}

/// `bundle install` for the puppet-strings checkout.
pub struct BundleInstall {
    timeout: Duration,
}

impl BundleInstall {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn command(&self, dir: &Path) -> CommandSpec {
        let gems = dir.join(".bundle").join("gems");
        CommandSpec::new("bundle")
            .args(["install", "--path"])
            .arg(gems.to_string_lossy())
            .current_dir(dir)
            .timeout(self.timeout)
    }

    pub async fn run(&self, dir: &Path) -> Result<()> {
        info!(dir = %dir.display(), "Installing documentation tool dependencies");
        if let Err(e) = self.command(dir).run().await {
            error!(
                error = %e,
                "Bundle install failed; make sure the packages listed in bindep.txt are installed"
            );
            return Err(e);
        }
        Ok(())
    }
}

impl Default for BundleInstall {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
