use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info};

use crate::error::{CloneFailureKind, ConfsyncError, Result};
use crate::process::{CommandSpec, DEFAULT_TIMEOUT};

/// Base URL used when a project has no explicit git URL.
pub const DEFAULT_GIT_BASE: &str = "https://github.com/openstack";

/// A repository to make available under a work directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub project: String,
    pub url: Option<String>,
    pub workdir: PathBuf,
}

impl CheckoutRequest {
    pub fn new(project: impl Into<String>, url: Option<String>, workdir: impl AsRef<Path>) -> Self {
        Self {
            project: project.into(),
            url,
            workdir: workdir.as_ref().to_path_buf(),
        }
    }

    /// `<workdir>/<project>`
    pub fn target_dir(&self) -> PathBuf {
        self.workdir.join(&self.project)
    }

    /// The explicit URL, or `https://github.com/openstack/<project>`.
    pub fn clone_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| format!("{}/{}", DEFAULT_GIT_BASE, self.project))
    }
}

/// Produces a local checkout for a project.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<PathBuf>;
}

/// Clones repositories with the `git` command line.
pub struct GitCheckout {
    timeout: Duration,
}

impl GitCheckout {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn clone_command(&self, request: &CheckoutRequest) -> CommandSpec {
        let target = request.target_dir();
        CommandSpec::new("git")
            .arg("clone")
            .arg(request.clone_url())
            .arg(target.to_string_lossy())
            .current_dir(&request.workdir)
            .timeout(self.timeout)
    }
}

impl Default for GitCheckout {
    fn default() -> Self {
        Self::new()
    }
}

fn is_non_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[async_trait]
impl CheckoutProvider for GitCheckout {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<PathBuf> {
        let target = request.target_dir();

        if is_non_empty_dir(&target) {
            error!(
                project = %request.project,
                dir = %target.display(),
                "Clone target already exists"
            );
            return Err(ConfsyncError::CloneFailed {
                project: request.project.clone(),
                kind: CloneFailureKind::AlreadyExists,
                message: format!("{} already exists and is not empty", target.display()),
            });
        }

        fs::create_dir_all(&request.workdir)?;

        info!(
            project = %request.project,
            url = %request.clone_url(),
            dir = %target.display(),
            "Cloning project"
        );

        match self.clone_command(request).run().await {
            Ok(_) => Ok(target),
            Err(ConfsyncError::CommandFailed { stderr, .. }) => {
                let kind = CloneFailureKind::from_git_stderr(&stderr);
                error!(project = %request.project, kind = %kind, "Clone failed");
                Err(ConfsyncError::CloneFailed {
                    project: request.project.clone(),
                    kind,
                    message: stderr,
                })
            }
            Err(ConfsyncError::CommandTimeout { seconds, .. }) => {
                error!(project = %request.project, seconds, "Clone timed out");
                Err(ConfsyncError::CloneFailed {
                    project: request.project.clone(),
                    kind: CloneFailureKind::Network,
                    message: format!("timed out after {seconds}s"),
                })
            }
            Err(e) => Err(e),
        }
    }
}

/// Uses `<workdir>/<project>` as-is; for runs with cloning disabled.
pub struct ExistingCheckout;

#[async_trait]
impl CheckoutProvider for ExistingCheckout {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<PathBuf> {
        let target = request.target_dir();
        if !target.is_dir() {
            return Err(ConfsyncError::CheckoutMissing { dir: target });
        }
        info!(project = %request.project, dir = %target.display(), "Using existing checkout");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_clone_url() {
        let request = CheckoutRequest::new("nova", None, "/work");
        assert_eq!(request.clone_url(), "https://github.com/openstack/nova");
        assert_eq!(request.target_dir(), PathBuf::from("/work/nova"));
    }

    #[test]
    fn test_explicit_clone_url() {
        let request = CheckoutRequest::new(
            "puppet-nova",
            Some("https://opendev.org/openstack/puppet-nova".to_string()),
            "/work",
        );
        assert_eq!(request.clone_url(), "https://opendev.org/openstack/puppet-nova");
    }

    #[test]
    fn test_clone_command() {
        let request = CheckoutRequest::new("nova", None, "/work");
        let spec = GitCheckout::new().clone_command(&request);
        assert_eq!(
            spec.to_string(),
            "git clone https://github.com/openstack/nova /work/nova"
        );
        assert_eq!(spec.cwd, Some(PathBuf::from("/work")));
    }

    #[tokio::test]
    async fn test_existing_non_empty_target_is_already_exists() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("nova");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("setup.py"), "").unwrap();

        let request = CheckoutRequest::new("nova", None, temp_dir.path());
        let err = GitCheckout::new().checkout(&request).await.unwrap_err();

        assert!(matches!(
            err,
            ConfsyncError::CloneFailed {
                kind: CloneFailureKind::AlreadyExists,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_existing_checkout_provider() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("nova")).unwrap();

        let request = CheckoutRequest::new("nova", None, temp_dir.path());
        let dir = ExistingCheckout.checkout(&request).await.unwrap();
        assert_eq!(dir, temp_dir.path().join("nova"));

        let missing = CheckoutRequest::new("glance", None, temp_dir.path());
        assert!(matches!(
            ExistingCheckout.checkout(&missing).await.unwrap_err(),
            ConfsyncError::CheckoutMissing { .. }
        ));
    }
}
