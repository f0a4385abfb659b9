//! External tool execution.
//!
//! Every program netloy starts (`dotnet`, `dpkg-deb`, `hdiutil`, ...) is
//! described by a [`ToolInvocation`] and run through a [`ToolRunner`]. The
//! default [`SystemRunner`] spawns real processes; tests substitute a runner
//! that fakes the tools.

use crate::bundler::error::{Error, Result};
use async_trait::async_trait;
use std::{
    collections::BTreeMap,
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};
use tokio_util::sync::CancellationToken;

/// Program, arguments, working directory and environment of one tool run.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ToolInvocation {
    /// Starts an invocation of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string_lossy().into_owned()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add every entry of `vars` to the environment.
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (k, v) in vars {
            self.env.insert(k.clone(), v.clone());
        }
        self
    }

    /// Program name or path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments in order.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Working directory, if set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Extra environment entries.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Value following `flag` in the argument list.
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().map(|a| {
            if a.contains(' ') {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        }));
        parts.join(" ")
    }
}

/// Captured result of a successful run.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

/// Runs external tools.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs the invocation to completion.
    ///
    /// A non-zero exit must be reported as [`Error::ExternalToolFailed`].
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput>;

    /// Whether `program` can be found.
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Runs tools as real child processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl SystemRunner {
    /// Runner with no time limit.
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            timeout: None,
        }
    }

    /// Kills tools that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ToolRunner for SystemRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput> {
        log::debug!("Running: {}", invocation.display_command());

        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd.spawn().map_err(|error| Error::CommandFailed {
            command: invocation.display_command(),
            error,
        })?;

        let wait = child.wait_with_output();
        let output = tokio::select! {
            _ = self.cancel.cancelled() => {
                return Err(Error::Cancelled(invocation.program.clone()));
            }
            result = async {
                match self.timeout {
                    Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                        Error::TimedOut {
                            tool: invocation.program.clone(),
                            seconds: limit.as_secs(),
                        }
                    }),
                    None => Ok(wait.await),
                }
            } => result?,
        }
        .map_err(|error| Error::CommandFailed {
            command: invocation.display_command(),
            error,
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            let captured = if stderr.trim().is_empty() {
                stdout
            } else {
                stderr
            };
            return Err(Error::ExternalToolFailed {
                tool: invocation.program.clone(),
                code: output.status.code(),
                output: captured.trim_end().to_string(),
            });
        }

        for line in stdout.lines() {
            log::debug!("[{}] {}", invocation.program, line);
        }
        Ok(ToolOutput { stdout, stderr })
    }
}

/// Splits a user-supplied argument string on whitespace.
///
/// Single and double quotes group words; the quotes themselves are removed.
pub fn split_args(text: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_word = false;

    for c in text.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    args.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        args.push(current);
    }
    args
}
