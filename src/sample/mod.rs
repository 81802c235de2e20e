//! Sample configuration extraction.
//!
//! Turns the `etc/*.sample` files a project generates into structured
//! section/parameter data:
//! - locating the generated samples inside a checkout
//! - normalizing them in place into plain `key = value` listings
//! - parsing the normalized text into sections
//! - aggregating the results for every sample of a project

pub mod aggregator;
pub mod extractor;
pub mod locator;
pub mod normalizer;

use std::collections::BTreeMap;

pub use aggregator::{aggregate, RunStatus, SampleFailure, SampleFilter, SampleSetReport};
pub use extractor::{extract_parameters, SectionedConfig};
pub use locator::{filter_conf_samples, find_conf_samples, locate_samples, SAMPLE_GLOB};
pub use normalizer::{normalize_file, normalize_text};

/// Parameters of one section: parameter name -> declared default (may be empty).
pub type SectionParameters = BTreeMap<String, String>;

/// Section name -> parameters declared in that section, for a single sample file.
pub type SampleParameterMap = BTreeMap<String, SectionParameters>;

/// Sample file base name -> its parameter map.
pub type ProjectParameterSet = BTreeMap<String, SampleParameterMap>;
