pub mod error;
pub mod git;
pub mod manifest;
pub mod pipeline;
pub mod process;
pub mod sample;
pub mod tooling;

pub use error::{CloneFailureKind, ConfsyncError, Result};
pub use git::{CheckoutProvider, CheckoutRequest, ExistingCheckout, GitCheckout};
pub use manifest::{
    ManifestCrossReferencer, ManifestIndex, ManifestMatch, ManifestReport, MatchKind,
};
pub use pipeline::{Pipeline, PipelineConfig, ProjectReport};
pub use process::{CommandOutput, CommandSpec};
pub use sample::{
    aggregate, extract_parameters, find_conf_samples, normalize_file, normalize_text,
    ProjectParameterSet, RunStatus, SampleFailure, SampleFilter, SampleParameterMap,
    SampleSetReport, SectionedConfig,
};
pub use tooling::{BundleInstall, SampleGenerator, ToxGenconfig};
