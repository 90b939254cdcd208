//! External command construction and execution.
//!
//! Every tool the pipeline touches (`uname`, `conda`, `git`, `anaconda`)
//! goes through [`CommandLine`]: environment variables are attached
//! explicitly per invocation rather than exported process-wide, and the
//! rendered form used for reporting and receipts redacts credentials.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use thiserror::Error;

/// Non-zero exit or failed launch of an external tool. The pipeline has no
/// richer failure taxonomy: everything is either this or a filesystem
/// error, and the first occurrence terminates the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to launch `{program}`; is it installed?")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with status {code}")]
    Exit { program: String, code: i32 },
}

/// Locations of the external tools. Defaults resolve through the search
/// path handed to each command; the `CONDA_NIGHTLY_<TOOL>_BIN` variables
/// substitute alternates (the test suites point them at fakes).
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub conda: PathBuf,
    pub git: PathBuf,
    pub anaconda: PathBuf,
    pub uname: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            conda: PathBuf::from("conda"),
            git: PathBuf::from("git"),
            anaconda: PathBuf::from("anaconda"),
            uname: PathBuf::from("uname"),
        }
    }
}

impl ToolPaths {
    pub fn from_env() -> Self {
        let pick = |var: &str, fallback: &str| {
            env::var(var)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(fallback))
        };
        Self {
            conda: pick("CONDA_NIGHTLY_CONDA_BIN", "conda"),
            git: pick("CONDA_NIGHTLY_GIT_BIN", "git"),
            anaconda: pick("CONDA_NIGHTLY_ANACONDA_BIN", "anaconda"),
            uname: pick("CONDA_NIGHTLY_UNAME_BIN", "uname"),
        }
    }
}

/// A fully specified external invocation: program, arguments, the
/// environment variables the tool requires, and the working directory.
#[derive(Debug, Clone)]
pub struct CommandLine {
    program: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    cwd: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
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

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg_slice(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering for the reporter and receipts. Token-bearing
    /// arguments and `*_TOKEN` environment values are redacted; the search
    /// path is attached to every command and omitted as noise.
    pub fn rendered(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        for (key, value) in &self.envs {
            if key == "PATH" {
                continue;
            }
            if key.ends_with("_TOKEN") {
                parts.push(format!("{key}=[REDACTED]"));
            } else {
                parts.push(format!("{key}={value}"));
            }
        }

        parts.push(self.program.display().to_string());

        let mut redact_next = false;
        for arg in &self.args {
            if redact_next {
                parts.push("[REDACTED]".to_string());
                redact_next = false;
                continue;
            }
            if arg == "-t" || arg == "--token" {
                redact_next = true;
            }
            parts.push(arg.clone());
        }

        parts.join(" ")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run the command with inherited stdio, the way the shell script let
    /// each tool stream into the CI log. Non-zero exit is an error.
    pub fn run(&self) -> Result<()> {
        let status = self.command().status().map_err(|source| ToolError::Launch {
            program: self.program_name(),
            source,
        })?;

        if !status.success() {
            return Err(ToolError::Exit {
                program: self.program_name(),
                code: status.code().unwrap_or(-1),
            }
            .into());
        }
        Ok(())
    }

    /// Run the command capturing stdout (trimmed). Used where the pipeline
    /// consumes the tool's output, e.g. the OS report.
    pub fn run_capture(&self) -> Result<String> {
        let output = self.command().output().map_err(|source| ToolError::Launch {
            program: self.program_name(),
            source,
        })?;

        if !output.status.success() {
            let tail = tail_lines(&String::from_utf8_lossy(&output.stderr), 20);
            let err = anyhow::Error::new(ToolError::Exit {
                program: self.program_name(),
                code: output.status.code().unwrap_or(-1),
            });
            return Err(if tail.is_empty() {
                err
            } else {
                err.context(format!("stderr: {tail}"))
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Last `n` lines of `s`, trimmed.
pub(crate) fn tail_lines(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let tail = if lines.len() <= n {
        lines
    } else {
        lines[lines.len() - n..].to_vec()
    };
    tail.join("\n").trim().to_string()
}
