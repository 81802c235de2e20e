//! Puppet manifest cross-referencing.
//!
//! Maps each configuration section found in the samples to the manifest
//! file(s) of the Puppet module that manage it.

pub mod index;
pub mod scanner;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

pub use index::{ManifestCrossReferencer, MANIFEST_DIR, MAIN_MANIFEST};
pub use scanner::ManifestTokens;

/// How a section got attributed to its manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// A manifest file or directory is named after the section.
    FileName,
    /// One of the section's parameters occurs in a main manifest.
    MainManifest,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::FileName => "file name",
            MatchKind::MainManifest => "main manifest",
        }
    }
}

/// Manifests attributed to one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestMatch {
    pub kind: MatchKind,
    /// Paths relative to the Puppet module root.
    pub files: Vec<PathBuf>,
    /// Parameter whose occurrence decided a main-manifest match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_parameter: Option<String>,
}

/// Section name -> manifests believed to declare its parameters.
pub type ManifestIndex = BTreeMap<String, ManifestMatch>;

/// Outcome of cross-referencing a parameter set against a Puppet module.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestReport {
    pub index: ManifestIndex,
    pub undocumented: BTreeSet<String>,
}

impl ManifestReport {
    pub fn is_documented(&self, section: &str) -> bool {
        self.index.contains_key(section)
    }
}
