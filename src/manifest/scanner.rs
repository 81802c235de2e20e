//! Token-level scan of Puppet manifests for parameter names.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

/// Identifiers as Puppet writes them; `$` and `::` scoping are not part of the name.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("valid identifier regex"));

/// `'section/option'` keys used by `*_config` resources.
static CONFIG_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"['"]([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+)['"]"#).expect("valid config key regex")
});

/// Identifiers and `section/option` keys that occur in one manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestTokens {
    pub path: PathBuf,
    words: HashSet<String>,
    config_keys: HashSet<(String, String)>,
}

impl ManifestTokens {
    pub fn from_source(path: PathBuf, source: &str) -> Self {
        let mut words = HashSet::new();
        let mut config_keys = HashSet::new();

        for line in source.lines() {
            let code = strip_comment(line);
            if code.is_empty() {
                continue;
            }
            for m in IDENTIFIER.find_iter(code) {
                words.insert(m.as_str().to_string());
            }
            for caps in CONFIG_KEY.captures_iter(code) {
                config_keys.insert((caps[1].to_lowercase(), caps[2].to_string()));
            }
        }

        Self {
            path,
            words,
            config_keys,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(Self::from_source(path.to_path_buf(), &source))
    }

    /// Whether `param` of `section` is mentioned, either as a whole-word
    /// identifier or as a `section/param` config key.
    pub fn mentions(&self, section: &str, param: &str) -> bool {
        self.words.contains(param)
            || self
                .config_keys
                .contains(&(section.to_lowercase(), param.to_string()))
    }

    /// First parameter of the section that this manifest mentions.
    pub fn first_mention<'a, I>(&self, section: &str, params: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        params.into_iter().find(|p| self.mentions(section, p))
    }
}

/// Drop a trailing `#` comment, ignoring `#` inside quoted strings.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match (quote, c) {
            (None, '#') => return line[..i].trim_end(),
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            _ => {}
        }
    }
    line.trim_end()
}
