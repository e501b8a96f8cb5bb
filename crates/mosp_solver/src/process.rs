use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use crate::{SolverError, SolverResult};

/// A solver executable, run to completion with positional arguments.
#[derive(Clone, Debug)]
pub struct SolverProcess {
    exe_path: PathBuf,
}

impl SolverProcess {
    pub fn new(exe_path: impl Into<PathBuf>) -> Self {
        Self {
            exe_path: exe_path.into(),
        }
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    /// Spawns the executable and blocks until it exits, capturing stdout and stderr.
    pub fn run<I, S>(&self, args: I, context: impl ToString) -> SolverResult<Output>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.exe_path)
            .args(args)
            .output().map_err(|e| {
            SolverError::other(format!(
                "{}: failed to start {}: {e}",
                context.to_string(),
                self.exe_path.display()
            ))
        })?;

        Self::ensure_success(context, output)
    }

    pub fn ensure_success(context: impl ToString, output: Output) -> SolverResult<Output> {
        if output.status.success() {
            Ok(output)
        } else {
            Err(SolverError::ProcessFailed {
                context: format!("{} ({})", context.to_string(), output.status),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            })
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::SolverProcess;
    use crate::SolverError;

    #[test]
    fn run_captures_stdout_of_successful_process() {
        let output = SolverProcess::new("/bin/sh")
            .run(["-c", "echo num_nodes: 4"], "echo")
            .expect("sh should run");
        assert_eq!(String::from_utf8_lossy(&output.stdout), "num_nodes: 4\n");
    }

    #[test]
    fn run_reports_non_zero_exit_with_streams() {
        let err = SolverProcess::new("/bin/sh")
            .run(["-c", "echo partial; echo boom >&2; exit 3"], "fake solver")
            .expect_err("exit 3 should fail");

        match err {
            SolverError::ProcessFailed {
                context,
                stdout,
                stderr,
            } => {
                assert!(context.starts_with("fake solver ("));
                assert_eq!(stdout, "partial\n");
                assert_eq!(stderr, "boom\n");
            }
            other => panic!("expected ProcessFailed, got {other:?}"),
        }
    }

    #[test]
    fn run_reports_missing_executable() {
        let err = SolverProcess::new("/definitely/not/a/solver")
            .run(["1"], "missing")
            .expect_err("spawn should fail");
        assert!(err.to_string().contains("failed to start /definitely/not/a/solver"));
    }
}
