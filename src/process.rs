// src/process.rs

//! External command execution
//!
//! Every external process the recipe starts (git, the vendor fetch script,
//! configure, make) is described by an [`Invocation`] and handed to a
//! [`CommandRunner`]. The system runner executes it; the dry-run runner only
//! records it, which the CLI exposes as `--dry-run` and tests use to observe
//! the exact command sequence.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tracing::{debug, info};

/// One external command, fully described
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Lifecycle step name used in logs and errors
    pub step: String,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Environment added on top of the inherited process environment
    pub env: BTreeMap<String, String>,
}

impl Invocation {
    pub fn new(step: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            program: program.into(),
            args: Vec::new(),
            cwd: PathBuf::from("."),
            env: BTreeMap::new(),
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

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = dir.to_path_buf();
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Rewrap the command as `<bash> -c '<command line>'`
    ///
    /// Used on Windows hosts, where configure scripts and the fetch script
    /// only run inside a POSIX shell.
    pub fn through_shell(self, bash: &Path) -> Self {
        let line = self.command_line();
        Self {
            program: bash.to_string_lossy().into_owned(),
            args: vec!["-c".to_string(), line],
            ..self
        }
    }

    /// Program and arguments joined, quoted for a POSIX shell
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.command_line())
    }
}

/// Captured output of a finished command
#[derive(Debug, Default, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Something that can execute an [`Invocation`]
///
/// Implementations must return an error for a non-zero exit status.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Whether commands are only recorded, so callers leave the
    /// filesystem alone as well
    fn records_only(&self) -> bool {
        false
    }
}

/// Runs commands on the host with `std::process::Command`
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        info!("Running {} phase", invocation.step);
        debug!("Command: {}", invocation.command_line());

        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .envs(&invocation.env)
            .output()
            .map_err(|source| Error::Spawn {
                step: invocation.step.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines() {
            debug!("{}: {}", invocation.step, line);
        }

        if !output.status.success() {
            return Err(Error::CommandFailed {
                step: invocation.step.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Records invocations without running anything
#[derive(Debug, Default)]
pub struct DryRunRunner {
    recorded: Mutex<Vec<Invocation>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocations seen so far, in order
    pub fn recorded(&self) -> Vec<Invocation> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        info!("(dry run) {}", invocation);
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(invocation.clone());
        Ok(CommandOutput::default())
    }

    fn records_only(&self) -> bool {
        true
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:+,@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line_quoting() {
        let inv = Invocation::new("configure", "./configure")
            .arg("--prefix=/tmp/pkg dir")
            .arg("--enable-shared=yes");
        assert_eq!(
            inv.command_line(),
            "./configure '--prefix=/tmp/pkg dir' --enable-shared=yes"
        );
    }

    #[test]
    fn test_quote_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_through_shell() {
        let inv = Invocation::new("source", "./get.Metis")
            .current_dir(Path::new("/src"))
            .through_shell(Path::new("/usr/bin/bash"));
        assert_eq!(inv.program, "/usr/bin/bash");
        assert_eq!(inv.args, vec!["-c".to_string(), "./get.Metis".to_string()]);
        assert_eq!(inv.cwd, PathBuf::from("/src"));
    }

    #[test]
    fn test_dry_run_records_in_order() {
        let runner = DryRunRunner::new();
        runner.run(&Invocation::new("a", "true")).unwrap();
        runner.run(&Invocation::new("b", "false")).unwrap();

        let steps: Vec<_> = runner.recorded().into_iter().map(|i| i.step).collect();
        assert_eq!(steps, vec!["a", "b"]);
        assert!(runner.records_only());
        assert!(!SystemRunner.records_only());
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_reports_failure() {
        let err = SystemRunner
            .run(&Invocation::new("shell", "sh").args(["-c", "echo oops >&2; exit 3"]))
            .unwrap_err();
        match err {
            Error::CommandFailed { step, code, stderr } => {
                assert_eq!(step, "shell");
                assert_eq!(code, Some(3));
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_passes_env() {
        let mut env = BTreeMap::new();
        env.insert("RECIPE_JOBS".to_string(), "42".to_string());
        let out = SystemRunner
            .run(&Invocation::new("shell", "sh").args(["-c", "echo $RECIPE_JOBS"]).envs(&env))
            .unwrap();
        assert_eq!(out.stdout.trim(), "42");
    }
}
