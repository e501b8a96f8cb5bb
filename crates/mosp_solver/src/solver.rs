use std::{
    ffi::OsString,
    fs, io,
    path::{Path, PathBuf},
};

use crate::{
    SolverError, SolverResult, console::ConsoleSummary, process::SolverProcess,
    report::RunReport,
};

/// One solver call: `<exe> <source> <target> <time_limit> <num_dims> <cost_files...> <result_file>`.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverInvocation {
    pub source: u64,
    pub target: u64,
    /// Seconds; enforced by the solver itself.
    pub time_limit: u64,
    pub cost_files: Vec<PathBuf>,
    pub result_file: PathBuf,
}

/// What a finished invocation produced.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverOutcome {
    pub report: RunReport,
    pub console: Option<ConsoleSummary>,
}

impl SolverInvocation {
    pub fn new(
        source: u64,
        target: u64,
        time_limit: u64,
        cost_files: Vec<PathBuf>,
        result_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            target,
            time_limit,
            cost_files,
            result_file: result_file.into(),
        }
    }

    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.source.to_string().into(),
            self.target.to_string().into(),
            self.time_limit.to_string().into(),
            self.cost_files.len().to_string().into(),
        ];
        args.extend(self.cost_files.iter().map(|path| path.as_os_str().to_owned()));
        args.push(self.result_file.as_os_str().to_owned());
        args
    }

    /// Runs the solver to completion and decodes its result file. With `decode_console`
    /// the captured stdout is decoded as well and a missing summary is an error.
    pub fn run(&self, process: &SolverProcess, decode_console: bool) -> SolverResult<SolverOutcome> {
        if self.cost_files.is_empty() {
            return Err(SolverError::invalid_input("at least one cost file is required"));
        }

        if let Some(parent) = self.result_file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        remove_stale(&self.result_file)?;

        let context = format!(
            "{} {}->{} dims={}",
            process.exe_path().display(),
            self.source,
            self.target,
            self.cost_files.len()
        );
        log::trace!("solver.invoke: {context} result_file={}", self.result_file.display());

        let output = process.run(self.args(), &context)?;

        if !self.result_file.exists() {
            return Err(SolverError::MissingOutput(self.result_file.clone()));
        }
        let report = RunReport::from_file(&self.result_file)?;

        let console = if decode_console {
            Some(ConsoleSummary::from_text(&String::from_utf8_lossy(
                &output.stdout,
            ))?)
        } else {
            None
        };

        Ok(SolverOutcome { report, console })
    }
}

/// A result file left over from an earlier call must not be mistaken for this call's output.
fn remove_stale(path: &Path) -> SolverResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SolverError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        ffi::OsString,
        fs,
        path::PathBuf,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::SolverInvocation;

    fn unique_temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("mosp-solver-tests-{name}-{nanos}"))
    }

    #[test]
    fn args_follow_positional_cli_order() {
        let invocation = SolverInvocation::new(
            3,
            9,
            600,
            vec![PathBuf::from("a_1.gr"), PathBuf::from("a_2.gr")],
            "out/res.txt",
        );

        let expected: Vec<OsString> = ["3", "9", "600", "2", "a_1.gr", "a_2.gr", "out/res.txt"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(invocation.args(), expected);
    }

    #[test]
    fn run_requires_cost_files() {
        let invocation = SolverInvocation::new(1, 2, 1, Vec::new(), "res.txt");
        let err = invocation
            .run(&super::SolverProcess::new("/bin/true"), false)
            .expect_err("no cost files");
        assert!(err.to_string().contains("at least one cost file"));
    }

    #[cfg(unix)]
    #[test]
    fn run_fails_when_solver_writes_nothing_even_if_a_stale_file_existed() {
        let dir = unique_temp_dir("stale");
        fs::create_dir_all(&dir).expect("create temp dir");
        let result_file = dir.join("res.txt");
        fs::write(&result_file, "stale").expect("write stale file");

        let invocation =
            SolverInvocation::new(1, 2, 1, vec![dir.join("map_1.gr")], result_file.clone());
        let err = invocation
            .run(&super::SolverProcess::new("/bin/true"), false)
            .expect_err("nothing written");

        assert!(matches!(err, crate::SolverError::MissingOutput(_)));
        assert!(!result_file.exists());

        fs::remove_dir_all(&dir).expect("cleanup temp dir");
    }
}
