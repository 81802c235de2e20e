//! Sectioned configuration parser for normalized sample files.
//!
//! Accepts the INI dialect produced by oslo-style sample generators:
//! `[section]` headers, `key = value` / `key: value` options, `;`/`#`
//! comments and indented continuation lines. Every file gets its own
//! parser; nothing is shared between samples.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfsyncError, Result};

use super::{SampleParameterMap, SectionParameters};

/// A parsed sectioned configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionedConfig {
    sections: BTreeMap<String, SectionParameters>,
}

impl SectionedConfig {
    /// Parse configuration text. `origin` is only used in error reports.
    pub fn parse(content: &str, origin: &Path) -> Result<Self> {
        let mut sections: BTreeMap<String, SectionParameters> = BTreeMap::new();
        let mut current: Option<String> = None;
        let mut last_key: Option<String> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                last_key = None;
                continue;
            }
            if trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }

            // Indented line following an option extends its value; an
            // indented header still opens a section.
            if raw.starts_with(|c: char| c.is_whitespace()) && !trimmed.starts_with('[') {
                if let (Some(section), Some(key)) = (current.as_ref(), last_key.as_ref()) {
                    if let Some(value) = sections
                        .get_mut(section)
                        .and_then(|params| params.get_mut(key))
                    {
                        if !value.is_empty() {
                            value.push('\n');
                        }
                        value.push_str(trimmed);
                        continue;
                    }
                }
            }

            if trimmed.starts_with('[') {
                let name = trimmed
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .map(str::trim)
                    .ok_or_else(|| parse_error(origin, line_no, "unterminated section header"))?;

                if name.is_empty() {
                    return Err(parse_error(origin, line_no, "empty section name"));
                }

                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                last_key = None;
                continue;
            }

            let (key, value) = split_option(trimmed)
                .ok_or_else(|| parse_error(origin, line_no, "expected `key = value`"))?;

            let section = current.as_ref().ok_or_else(|| {
                parse_error(origin, line_no, "option declared before any section header")
            })?;

            if key.is_empty() {
                return Err(parse_error(origin, line_no, "empty option name"));
            }

            if let Some(params) = sections.get_mut(section) {
                params.insert(key.to_string(), value.to_string());
            }
            last_key = Some(key.to_string());
        }

        Ok(Self { sections })
    }

    /// Read and parse a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Names of all declared sections.
    pub fn sections(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Parameters declared in `section`.
    pub fn get(&self, section: &str) -> Option<&SectionParameters> {
        self.sections.get(section)
    }

    /// Value of a single option.
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.get(section)?.get(key).map(String::as_str)
    }

    pub fn into_map(self) -> SampleParameterMap {
        self.sections
    }
}

/// Split `key = value` or `key: value` on whichever separator comes first.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    Some((line[..pos].trim(), line[pos + 1..].trim()))
}

fn parse_error(file: &Path, line: usize, message: &str) -> ConfsyncError {
    ConfsyncError::SampleParse {
        file: PathBuf::from(file),
        line,
        message: message.to_string(),
    }
}

/// Build the section -> parameter map of a normalized sample file.
pub fn extract_parameters(path: &Path) -> Result<SampleParameterMap> {
    let map = SectionedConfig::from_file(path)?.into_map();

    debug!(
        file = %path.display(),
        sections = map.len(),
        "Extracted sample parameters"
    );

    Ok(map)
}
