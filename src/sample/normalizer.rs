//! In-place cleanup of generated sample files.
//!
//! Three passes, in this order:
//! 1. drop every line containing `# ` (help text)
//! 2. strip every remaining `#` (uncomments `#key = default` lines)
//! 3. drop empty lines
//!
//! The second pass removes `#` anywhere in a line, including inside values.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::Result;

const HELP_MARKER: &str = "# ";

/// Normalize sample text.
pub fn normalize_text(content: &str) -> String {
    let mut out = String::with_capacity(content.len());

    let lines = content
        .lines()
        .filter(|line| !line.contains(HELP_MARKER))
        .map(|line| line.replace('#', ""))
        .filter(|line| !line.is_empty());

    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Rewrite a sample file in place. Each sample must be normalized exactly once.
pub fn normalize_file(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)?;
    let normalized = normalize_text(&content);

    debug!(
        file = %path.display(),
        before = content.lines().count(),
        after = normalized.lines().count(),
        "Normalized sample file"
    );

    fs::write(path, normalized)?;
    Ok(())
}
