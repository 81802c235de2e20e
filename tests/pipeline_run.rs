//! Integration tests for a full pipeline run with in-process checkout and
//! sample generation fakes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use confsync::{
    CheckoutProvider, CheckoutRequest, CloneFailureKind, ConfsyncError, Pipeline, PipelineConfig,
    Result, RunStatus, SampleFilter, SampleGenerator,
};

fn create_file(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Serves checkouts from directories prepared in the workdir; unknown
/// projects fail as "not found".
#[derive(Default)]
struct FakeCheckout {
    requests: Mutex<Vec<String>>,
}

#[async_trait]
impl CheckoutProvider for FakeCheckout {
    async fn checkout(&self, request: &CheckoutRequest) -> Result<PathBuf> {
        self.requests.lock().unwrap().push(request.project.clone());
        let dir = request.target_dir();
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(ConfsyncError::CloneFailed {
                project: request.project.clone(),
                kind: CloneFailureKind::NotFound,
                message: "repository not found".to_string(),
            })
        }
    }
}

/// Writes a fixed sample into `etc/`, like `tox -e genconfig` would.
struct FakeGenerator {
    samples: Vec<(&'static str, &'static str)>,
}

#[async_trait]
impl SampleGenerator for FakeGenerator {
    async fn generate(&self, checkout: &Path) -> Result<()> {
        for (name, content) in &self.samples {
            create_file(checkout, &format!("etc/{name}"), content);
        }
        Ok(())
    }
}

struct FailingGenerator;

#[async_trait]
impl SampleGenerator for FailingGenerator {
    async fn generate(&self, checkout: &Path) -> Result<()> {
        Err(ConfsyncError::SampleGeneration {
            project: checkout.display().to_string(),
            source: Box::new(ConfsyncError::CommandFailed {
                command: "tox -e genconfig".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "ERROR: unknown environment 'genconfig'".to_string(),
            }),
        })
    }
}

fn glance_generator() -> Box<FakeGenerator> {
    Box::new(FakeGenerator {
        samples: vec![
            (
                "glance-api.conf.sample",
                "[DEFAULT]\n# Port the server listens on.\n#bind_port = 9292\n\n[glance_store]\n#stores = file,http\n",
            ),
            ("glance-cache.conf.sample", "[DEFAULT]\n#image_cache_dir = <None>\n"),
            ("glance-policy.yaml.sample", "# \"default\": \"\"\n"),
        ],
    })
}

fn workdir_with_projects() -> TempDir {
    let workdir = TempDir::new().unwrap();
    fs::create_dir_all(workdir.path().join("glance")).unwrap();
    create_file(
        workdir.path(),
        "puppet-glance/manifests/init.pp",
        "class glance($bind_port = 9292) {}\n",
    );
    workdir
}

fn config(workdir: &Path) -> PipelineConfig {
    PipelineConfig {
        bootstrap_docs: false,
        ..PipelineConfig::new("glance", workdir)
    }
}

// ============================================================================
// Successful runs
// ============================================================================

mod successful_runs {
    use super::*;

    #[tokio::test]
    async fn test_full_run() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.project, "glance");
        assert_eq!(report.puppet_project, "puppet-glance");
        assert_eq!(report.samples.status(), RunStatus::Complete);
        assert_eq!(report.samples.parameters.len(), 2);
        assert_eq!(
            report.samples.parameters["glance-api.conf.sample"]["DEFAULT"]["bind_port"],
            "9292"
        );

        let manifests = report.manifests.expect("manifests cross-referenced");
        assert!(manifests.index.contains_key("DEFAULT"));
        assert!(manifests.undocumented.contains("glance_store"));
        assert!(report.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_conf_sample_narrows_report() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            PipelineConfig {
                conf_sample: Some("glance-cache.conf.sample".to_string()),
                ..config(workdir.path())
            },
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let report = pipeline.run().await.unwrap();

        assert_eq!(
            report.samples.parameters.keys().collect::<Vec<_>>(),
            vec!["glance-cache.conf.sample"]
        );
    }

    #[tokio::test]
    async fn test_missing_puppet_module_degrades() {
        let workdir = TempDir::new().unwrap();
        fs::create_dir_all(workdir.path().join("glance")).unwrap();

        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let report = pipeline.run().await.unwrap();

        assert!(report.manifests.is_none());
        assert_eq!(report.samples.parameters.len(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("puppet-glance: "));
    }

    #[tokio::test]
    async fn test_skip_manifests_does_not_checkout_puppet_module() {
        let workdir = workdir_with_projects();
        let checkout = std::sync::Arc::new(FakeCheckout::default());

        struct Shared(std::sync::Arc<FakeCheckout>);

        #[async_trait]
        impl CheckoutProvider for Shared {
            async fn checkout(&self, request: &CheckoutRequest) -> Result<PathBuf> {
                self.0.checkout(request).await
            }
        }

        let pipeline = Pipeline::with_providers(
            PipelineConfig {
                cross_reference: false,
                ..config(workdir.path())
            },
            Box::new(Shared(checkout.clone())),
            glance_generator(),
        );

        let report = pipeline.run().await.unwrap();

        assert!(report.manifests.is_none());
        assert_eq!(*checkout.requests.lock().unwrap(), vec!["glance".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_docs_bootstrap_only_warns() {
        // puppet-strings is not in the workdir, so its checkout fails.
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            PipelineConfig {
                bootstrap_docs: true,
                ..config(workdir.path())
            },
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.samples.status(), RunStatus::Complete);
        assert_eq!(report.samples.parameters.len(), 2);
        assert!(report.manifests.is_some());
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].starts_with("puppet-strings: "));
    }

    #[tokio::test]
    async fn test_broken_sample_is_reported_not_fatal() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            Box::new(FakeGenerator {
                samples: vec![
                    ("glance-api.conf.sample", "[DEFAULT]\n#bind_port = 9292\n"),
                    ("glance-scrubber.conf.sample", "wakeup_time = 300\n"),
                ],
            }),
        );

        let report = pipeline.run().await.unwrap();

        assert_eq!(report.samples.status(), RunStatus::Degraded);
        assert_eq!(report.samples.failures[0].sample, "glance-scrubber.conf.sample");
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("glance-scrubber.conf.sample: ")));
    }
}

// ============================================================================
// Halting conditions
// ============================================================================

mod halting {
    use super::*;

    #[tokio::test]
    async fn test_checkout_failure_halts() {
        let workdir = TempDir::new().unwrap();
        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(
            err,
            ConfsyncError::CloneFailed {
                kind: CloneFailureKind::NotFound,
                ref project,
                ..
            } if project == "glance"
        ));
    }

    #[tokio::test]
    async fn test_sample_generation_failure_halts() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            Box::new(FailingGenerator),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, ConfsyncError::SampleGeneration { .. }));
    }

    #[tokio::test]
    async fn test_no_samples_halts() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            config(workdir.path()),
            Box::new(FakeCheckout::default()),
            Box::new(FakeGenerator {
                samples: vec![("glance-policy.yaml.sample", "{}\n")],
            }),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, ConfsyncError::NoSamples { .. }));
    }

    #[tokio::test]
    async fn test_strict_sample_filter_halts() {
        let workdir = workdir_with_projects();
        let pipeline = Pipeline::with_providers(
            PipelineConfig {
                conf_sample: Some("nova.conf.sample".to_string()),
                sample_filter: SampleFilter::Strict,
                ..config(workdir.path())
            },
            Box::new(FakeCheckout::default()),
            glance_generator(),
        );

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, ConfsyncError::SampleNotFound(_)));
    }
}
