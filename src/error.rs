use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a clone attempt failed, as far as git's output lets us tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneFailureKind {
    AlreadyExists,
    Network,
    Auth,
    NotFound,
    Other,
}

impl CloneFailureKind {
    /// Classify git's stderr output.
    pub fn from_git_stderr(stderr: &str) -> Self {
        let lower = stderr.to_lowercase();

        if lower.contains("already exists") {
            CloneFailureKind::AlreadyExists
        } else if lower.contains("could not resolve host")
            || lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("network is unreachable")
        {
            CloneFailureKind::Network
        } else if lower.contains("authentication failed")
            || lower.contains("could not read username")
            || lower.contains("permission denied")
        {
            CloneFailureKind::Auth
        } else if lower.contains("not found") || lower.contains("does not exist") {
            CloneFailureKind::NotFound
        } else {
            CloneFailureKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CloneFailureKind::AlreadyExists => "already exists",
            CloneFailureKind::Network => "network",
            CloneFailureKind::Auth => "authentication",
            CloneFailureKind::NotFound => "repository not found",
            CloneFailureKind::Other => "other",
        }
    }
}

impl fmt::Display for CloneFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ConfsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Failed to clone {project} ({kind}): {message}")]
    CloneFailed {
        project: String,
        kind: CloneFailureKind,
        message: String,
    },

    #[error("Failed to start `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` timed out after {seconds}s")]
    CommandTimeout { command: String, seconds: u64 },

    #[error("Sample generation failed for {project}: {source}")]
    SampleGeneration {
        project: String,
        #[source]
        source: Box<ConfsyncError>,
    },

    #[error("No configuration sample files found under {}", dir.display())]
    NoSamples { dir: PathBuf },

    #[error("Failed to parse {}:{line}: {message}", file.display())]
    SampleParse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Manifest directory not found: {}", dir.display())]
    ManifestDirMissing { dir: PathBuf },

    #[error("Sample file not found: {0}")]
    SampleNotFound(String),

    #[error("Checkout directory not found: {}", dir.display())]
    CheckoutMissing { dir: PathBuf },
}

pub type Result<T> = std::result::Result<T, ConfsyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_failure_kind_from_stderr() {
        assert_eq!(
            CloneFailureKind::from_git_stderr(
                "fatal: unable to access 'https://x/': Could not resolve host: x"
            ),
            CloneFailureKind::Network
        );
        assert_eq!(
            CloneFailureKind::from_git_stderr("fatal: Authentication failed for 'https://x/'"),
            CloneFailureKind::Auth
        );
        assert_eq!(
            CloneFailureKind::from_git_stderr("remote: Repository not found."),
            CloneFailureKind::NotFound
        );
        assert_eq!(
            CloneFailureKind::from_git_stderr(
                "fatal: destination path 'nova' already exists and is not an empty directory."
            ),
            CloneFailureKind::AlreadyExists
        );
        assert_eq!(
            CloneFailureKind::from_git_stderr("fatal: something odd"),
            CloneFailureKind::Other
        );
    }

    #[test]
    fn test_sample_parse_message_names_file_and_line() {
        let err = ConfsyncError::SampleParse {
            file: PathBuf::from("etc/nova.conf.sample"),
            line: 7,
            message: "option outside of any section".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to parse etc/nova.conf.sample:7: option outside of any section"
        );
    }
}
