//! Section -> manifest resolution.
//!
//! Per section, in order:
//! 1. `manifests/<section>.pp` and `manifests/<section>/*.pp`
//! 2. for `a_b` names, `manifests/<a>/<b>.pp` (e.g. `keystone_authtoken`)
//! 3. the first main manifest (`init.pp`, then the other top-level `*.pp`
//!    by name) mentioning any of the section's parameters
//!
//! A file-name hit always beats the main-manifest scan. Sections with no hit
//! are reported as undocumented.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ConfsyncError, Result};
use crate::sample::ProjectParameterSet;

use super::scanner::ManifestTokens;
use super::{ManifestMatch, ManifestReport, MatchKind};

pub const MANIFEST_DIR: &str = "manifests";
pub const MAIN_MANIFEST: &str = "init.pp";

const MANIFEST_EXT: &str = "pp";

pub struct ManifestCrossReferencer {
    /// Every `.pp` file, relative to the module root.
    files: BTreeSet<PathBuf>,
    main_manifests: Vec<ManifestTokens>,
}

impl ManifestCrossReferencer {
    /// Index the manifests of the Puppet module checked out at `module_root`.
    pub fn new(module_root: impl AsRef<Path>) -> Result<Self> {
        let module_root = module_root.as_ref().to_path_buf();
        let manifest_dir = module_root.join(MANIFEST_DIR);

        if !manifest_dir.is_dir() {
            return Err(ConfsyncError::ManifestDirMissing { dir: manifest_dir });
        }

        let mut files = BTreeSet::new();
        for entry in WalkDir::new(&manifest_dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable manifest entry");
                    continue;
                }
            };
            let path = entry.path();
            if entry.file_type().is_file()
                && path.extension().is_some_and(|ext| ext == MANIFEST_EXT)
            {
                if let Ok(rel) = path.strip_prefix(&module_root) {
                    files.insert(rel.to_path_buf());
                }
            }
        }

        let main_manifests = Self::main_manifest_paths(&files)
            .into_iter()
            .map(|rel| {
                let mut tokens = ManifestTokens::from_file(&module_root.join(&rel))?;
                tokens.path = rel;
                Ok(tokens)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            module = %module_root.display(),
            manifests = files.len(),
            main = main_manifests.len(),
            "Indexed Puppet manifests"
        );

        Ok(Self {
            files,
            main_manifests,
        })
    }

    /// All `.pp` files, relative to the module root.
    pub fn manifest_files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// `init.pp` first, then the other top-level manifests sorted by name.
    fn main_manifest_paths(files: &BTreeSet<PathBuf>) -> Vec<PathBuf> {
        let manifest_dir = Path::new(MANIFEST_DIR);
        let init = manifest_dir.join(MAIN_MANIFEST);

        let mut paths = Vec::new();
        if files.contains(&init) {
            paths.push(init.clone());
        }
        paths.extend(
            files
                .iter()
                .filter(|p| p.parent() == Some(manifest_dir) && **p != init)
                .cloned(),
        );
        paths
    }

    /// Manifests named after the section.
    fn match_by_name(&self, section: &str) -> Vec<PathBuf> {
        let name = section.to_lowercase();
        let manifest_dir = Path::new(MANIFEST_DIR);

        let mut found = Vec::new();
        let exact = manifest_dir.join(format!("{name}.{MANIFEST_EXT}"));
        if self.files.contains(&exact) {
            found.push(exact);
        }

        let subdir = manifest_dir.join(&name);
        found.extend(
            self.files
                .iter()
                .filter(|p| p.parent() == Some(subdir.as_path()))
                .cloned(),
        );
        if !found.is_empty() {
            return found;
        }

        for (idx, _) in name.match_indices('_') {
            let (head, tail) = (&name[..idx], &name[idx + 1..]);
            if head.is_empty() || tail.is_empty() {
                continue;
            }
            let nested = manifest_dir
                .join(head)
                .join(format!("{tail}.{MANIFEST_EXT}"));
            if self.files.contains(&nested) {
                return vec![nested];
            }
        }

        Vec::new()
    }

    /// Resolve one section given its parameter names.
    pub fn resolve_section<'a, I>(&self, section: &str, params: I) -> Option<ManifestMatch>
    where
        I: IntoIterator<Item = &'a str> + Clone,
    {
        let by_name = self.match_by_name(section);
        if !by_name.is_empty() {
            return Some(ManifestMatch {
                kind: MatchKind::FileName,
                files: by_name,
                matched_parameter: None,
            });
        }

        self.main_manifests.iter().find_map(|manifest| {
            manifest
                .first_mention(section, params.clone())
                .map(|param| ManifestMatch {
                    kind: MatchKind::MainManifest,
                    files: vec![manifest.path.clone()],
                    matched_parameter: Some(param.to_string()),
                })
        })
    }

    /// Attribute every section of the parameter set to manifests.
    pub fn cross_reference(&self, params: &ProjectParameterSet) -> ManifestReport {
        let mut sections: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for sample in params.values() {
            for (section, options) in sample {
                sections
                    .entry(section.as_str())
                    .or_default()
                    .extend(options.keys().map(String::as_str));
            }
        }

        let mut report = ManifestReport::default();
        for (section, options) in sections {
            match self.resolve_section(section, options.iter().copied()) {
                Some(found) => {
                    debug!(
                        section,
                        kind = found.kind.as_str(),
                        files = ?found.files,
                        "Resolved section"
                    );
                    report.index.insert(section.to_string(), found);
                }
                None => {
                    warn!(section, "Section is not documented in any manifest");
                    report.undocumented.insert(section.to_string());
                }
            }
        }

        info!(
            documented = report.index.len(),
            undocumented = report.undocumented.len(),
            "Cross-referenced sections"
        );

        report
    }
}
