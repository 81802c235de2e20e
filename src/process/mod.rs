//! External command execution.
//!
//! Every external tool call is described by a [`CommandSpec`]: argument list,
//! working directory, accepted exit codes and a timeout. Exit codes outside the
//! accepted set, timeouts and spawn failures all surface as errors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::{ConfsyncError, Result};

/// Default upper bound for a single external command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Description of one external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub expected_codes: Vec<i32>,
    pub timeout: Duration,
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            expected_codes: vec![0],
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn expect_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.expected_codes = codes.into_iter().collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command to completion, capturing its output.
    pub async fn run(&self) -> Result<CommandOutput> {
        let rendered = self.to_string();
        info!(command = %rendered, cwd = ?self.cwd, "Running command");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|e| ConfsyncError::CommandSpawn {
            command: rendered.clone(),
            source: e,
        })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ConfsyncError::CommandSpawn {
                    command: rendered,
                    source: e,
                })
            }
            Err(_) => {
                error!(
                    command = %rendered,
                    seconds = self.timeout.as_secs(),
                    "Command timed out"
                );
                return Err(ConfsyncError::CommandTimeout {
                    command: rendered,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        let code = match output.status.code() {
            Some(code) if self.expected_codes.contains(&code) => code,
            _ => {
                return Err(ConfsyncError::CommandFailed {
                    command: rendered,
                    status: output.status.to_string(),
                    stderr: stderr.trim().to_string(),
                })
            }
        };

        debug!(command = %rendered, code, "Command finished");
        Ok(CommandOutput {
            code,
            stdout,
            stderr,
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
