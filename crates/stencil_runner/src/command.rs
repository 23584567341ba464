//! Command specifications.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a command's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Inherit the harness's stdout/stderr
    #[default]
    Stream,
    /// Capture stdout/stderr into the execution result
    Capture,
}

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
    /// Output handling
    pub output: OutputMode,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            output: OutputMode::Stream,
        }
    }

    /// Split a command line on whitespace. No quoting is supported.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next().unwrap_or_default();
        Self {
            args: parts.collect(),
            ..Self::new(program)
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

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Capture output instead of streaming it.
    pub fn capture(mut self) -> Self {
        self.output = OutputMode::Capture;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// The program path to execute. A relative path with a separator
    /// (`./simple.py`, `bin/server`) is resolved against the working
    /// directory and made absolute, since the child applies `cwd` itself
    /// before exec.
    pub fn resolved_program(&self) -> PathBuf {
        let program = Path::new(&self.program);
        match &self.cwd {
            Some(cwd) if program.is_relative() && self.program.contains('/') => {
                let joined = cwd.join(program);
                if joined.is_absolute() {
                    joined
                } else {
                    std::env::current_dir()
                        .map(|dir| dir.join(&joined))
                        .unwrap_or(joined)
                }
            }
            _ => program.to_path_buf(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
