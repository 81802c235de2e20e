//! Report rendering for the command line.

use std::fmt::Write;

use confsync::manifest::ManifestReport;
use confsync::pipeline::ProjectReport;

use crate::error::Result;

pub fn render_json(report: &ProjectReport) -> Result<String> {
    let mut out = serde_json::to_string_pretty(report)?;
    out.push('\n');
    Ok(out)
}

pub fn render_text(report: &ProjectReport) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Project: {} (puppet module: {})",
        report.project, report.puppet_project
    );

    for (sample, sections) in &report.samples.parameters {
        let _ = writeln!(out, "\n{}", sample);
        for (section, params) in sections {
            let _ = writeln!(out, "  [{}]", section);
            for (name, value) in params {
                if value.is_empty() {
                    let _ = writeln!(out, "    {} =", name);
                } else {
                    let _ = writeln!(out, "    {} = {}", name, value.replace('\n', "\\n"));
                }
            }
        }
    }

    if !report.samples.failures.is_empty() {
        let _ = writeln!(out, "\nFailed samples:");
        for failure in &report.samples.failures {
            let _ = writeln!(out, "  {}: {}", failure.sample, failure.error);
        }
    }

    if let Some(manifests) = &report.manifests {
        render_manifests(&mut out, manifests);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\nWarnings:");
        for warning in &report.warnings {
            let _ = writeln!(out, "  {}", warning);
        }
    }

    let _ = writeln!(
        out,
        "\nSamples: {} parsed, {} failed ({})",
        report.samples.succeeded(),
        report.samples.failed(),
        report.samples.status().as_str()
    );

    out
}

fn render_manifests(out: &mut String, manifests: &ManifestReport) {
    let _ = writeln!(out, "\nManifests:");
    for (section, found) in &manifests.index {
        let files: Vec<String> = found
            .files
            .iter()
            .map(|f| f.display().to_string())
            .collect();
        let _ = write!(out, "  {} -> {} ({}", section, files.join(", "), found.kind.as_str());
        if let Some(param) = &found.matched_parameter {
            let _ = write!(out, ", via {}", param);
        }
        let _ = writeln!(out, ")");
    }

    if !manifests.undocumented.is_empty() {
        let _ = writeln!(out, "\nUndocumented sections:");
        for section in &manifests.undocumented {
            let _ = writeln!(out, "  {}", section);
        }
    }
}
