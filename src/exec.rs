use std::{
    io::{BufRead, BufReader, Lines},
    path::Path,
    process::{Child, ChildStdout, Command, Stdio},
};

use log::{debug, trace};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("Empty command")]
    EmptyCommand,
    #[error("Could not start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("Error while reading output of `{program}`: {source}")]
    Read {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` failed: {status}")]
    Failed {
        program: String,
        status: std::process::ExitStatus,
    },
}

/// The command-execution seam used by the VCS backends. Implemented by
/// [`ProcessRunner`] for real tool invocations and by scripted doubles in
/// tests, so a backend's command sequence can be asserted without the tools
/// installed.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, forwarding each output line to the log.
    fn run_logged(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), ExecError>;

    /// Run to completion and collect the output lines.
    fn run_collect(&self, args: &[&str], cwd: Option<&Path>) -> Result<Vec<String>, ExecError>;
}

/// Runs external tools (`git`, `hg`, `svn`, ...) and exposes their standard
/// output as a lazy line sequence. On a native Windows shell (no POSIX
/// emulation layer signalled by the environment) commands are issued through
/// `cmd /C`; everywhere else they are executed directly.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    shell_prefix: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        ProcessRunner {
            shell_prefix: native_windows_shell(),
        }
    }

    /// Spawn `args` (program followed by its arguments), optionally in `cwd`,
    /// and return its output lines as they are produced. The sequence is
    /// finite and non-restartable; draining it past the end reports a
    /// non-zero exit status as an error.
    pub fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<OutputLines, ExecError> {
        let (program, arguments) = match args.split_first() {
            Some(split) => split,
            None => return Err(ExecError::EmptyCommand),
        };

        let mut command = if self.shell_prefix {
            let mut command = Command::new("cmd");
            command.arg("/C").args(args);
            command
        } else {
            let mut command = Command::new(program);
            command.args(arguments);
            command
        };
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        trace!("Running {:?}", args);
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                program: (*program).to_owned(),
                source,
            })?;

        // stdout is always piped, so take() cannot return None here.
        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                return Err(ExecError::Read {
                    program: (*program).to_owned(),
                    source: std::io::Error::other("stdout was not captured"),
                })
            }
        };

        Ok(OutputLines {
            program: (*program).to_owned(),
            child,
            lines: BufReader::new(stdout).lines(),
            finished: false,
        })
    }

}

impl CommandRunner for ProcessRunner {
    fn run_logged(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), ExecError> {
        let program = args.first().copied().unwrap_or_default().to_owned();
        for line in self.run(args, cwd)? {
            let line = line?;
            debug!("{}: {}", program, line);
        }
        Ok(())
    }

    fn run_collect(&self, args: &[&str], cwd: Option<&Path>) -> Result<Vec<String>, ExecError> {
        self.run(args, cwd)?.collect()
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Lazy standard-output lines of a spawned process. Yields an error as its
/// final item if the process exits with a non-zero status.
pub struct OutputLines {
    program: String,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    finished: bool,
}

impl Iterator for OutputLines {
    type Item = Result<String, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.lines.next() {
            Some(Ok(line)) => Some(Ok(line)),
            Some(Err(source)) => {
                self.finished = true;
                Some(Err(ExecError::Read {
                    program: self.program.clone(),
                    source,
                }))
            }
            None => {
                self.finished = true;
                match self.child.wait() {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(Err(ExecError::Failed {
                        program: self.program.clone(),
                        status,
                    })),
                    Err(source) => Some(Err(ExecError::Read {
                        program: self.program.clone(),
                        source,
                    })),
                }
            }
        }
    }
}

impl Drop for OutputLines {
    fn drop(&mut self) {
        // An abandoned sequence must not leave a zombie behind.
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// A native Windows shell needs the `cmd /C` prefix; a POSIX emulation layer
/// (cygwin, msys) signalled by the environment does not.
fn native_windows_shell() -> bool {
    if !cfg!(windows) {
        return false;
    }
    let emulated = std::env::var("OSTYPE")
        .map(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("cygwin") || value.contains("msys")
        })
        .unwrap_or(false)
        || std::env::var_os("MSYSTEM").is_some();
    !emulated
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn collects_output_lines() {
        let runner = ProcessRunner::new();
        let lines = runner.run_collect(&["printf", "one\ntwo\n"], None).unwrap();
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn runs_in_the_given_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new();
        let lines = runner.run_collect(&["pwd"], Some(dir.path())).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            std::fs::canonicalize(&lines[0]).unwrap(),
            std::fs::canonicalize(dir.path()).unwrap()
        );
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let runner = ProcessRunner::new();
        let error = runner.run_logged(&["false"], None).unwrap_err();
        assert!(matches!(error, ExecError::Failed { .. }), "{error:?}");
    }

    #[test]
    fn missing_executable_is_an_error() {
        let runner = ProcessRunner::new();
        let error = runner
            .run(&["srcfetch-no-such-tool"], None)
            .err()
            .expect("spawn should fail");
        assert!(matches!(error, ExecError::Spawn { .. }), "{error:?}");
    }

    #[test]
    fn dropping_unfinished_output_reaps_the_child() {
        use std::time::{Duration, Instant};

        let runner = ProcessRunner::new();
        let start = Instant::now();
        let lines = runner.run(&["sleep", "30"], None).unwrap();
        drop(lines);
        assert!(
            start.elapsed() < Duration::from_secs(10),
            "drop must kill and reap, not wait for exit"
        );
    }

    #[test]
    fn empty_command_is_rejected() {
        let runner = ProcessRunner::new();
        assert!(matches!(
            runner.run(&[], None),
            Err(ExecError::EmptyCommand)
        ));
    }
}
