use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    str::FromStr,
};

use mosp_solver::solver::SolverInvocation;

use crate::{Error, Result};

/// Solver family a test is dispatched to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Algorithm {
    Emoa,
    Boa,
}

impl Algorithm {
    pub const ALL: [Algorithm; 2] = [Algorithm::Emoa, Algorithm::Boa];

    pub fn parse(tag: &str) -> Result<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "emoa" => Ok(Self::Emoa),
            "boa" => Ok(Self::Boa),
            _ => Err(Error::UnknownAlgorithm(tag.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emoa => "emoa",
            Self::Boa => "boa",
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One solver run to perform. Tests sharing a `test_number` differ only by algorithm.
#[derive(Clone, Debug, PartialEq)]
pub struct TestSpec {
    pub test_number: usize,
    pub algorithm: Algorithm,
    /// Human-readable instance label, e.g. `NY` or `simple map 3 dims`.
    pub instance: String,
    /// Seconds, passed through to the solver.
    pub time_limit: u64,
    pub source: u64,
    pub target: u64,
    pub result_file: PathBuf,
    pub cost_files: Vec<PathBuf>,
}

impl TestSpec {
    /// One spec per algorithm, all sharing `test_number`, endpoints and cost files.
    #[allow(clippy::too_many_arguments)]
    pub fn group(
        algorithms: &[Algorithm],
        test_number: usize,
        instance: &str,
        time_limit: u64,
        source: u64,
        target: u64,
        result_file: &Path,
        cost_files: &[PathBuf],
    ) -> Vec<Self> {
        algorithms
            .iter()
            .map(|algorithm| Self {
                test_number,
                algorithm: *algorithm,
                instance: instance.to_string(),
                time_limit,
                source,
                target,
                result_file: result_file.to_path_buf(),
                cost_files: cost_files.to_vec(),
            })
            .collect()
    }

    pub fn num_dims(&self) -> usize {
        self.cost_files.len()
    }

    /// Same test, writing its report to `result_file`.
    pub fn with_result_file(&self, result_file: impl Into<PathBuf>) -> Self {
        Self {
            result_file: result_file.into(),
            ..self.clone()
        }
    }

    pub fn invocation(&self) -> SolverInvocation {
        SolverInvocation::new(
            self.source,
            self.target,
            self.time_limit,
            self.cost_files.clone(),
            self.result_file.clone(),
        )
    }

    pub(crate) fn joined_cost_files(&self) -> String {
        self.cost_files
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, path::PathBuf};

    use super::{Algorithm, TestSpec};
    use crate::Error;

    #[test]
    fn algorithm_parse_accepts_known_tags() {
        assert_eq!(Algorithm::parse("emoa").expect("parse"), Algorithm::Emoa);
        assert_eq!(Algorithm::parse(" BOA ").expect("parse"), Algorithm::Boa);
        assert_eq!("boa".parse::<Algorithm>().expect("parse"), Algorithm::Boa);
        assert_eq!(Algorithm::Emoa.to_string(), "emoa");
    }

    #[test]
    fn algorithm_parse_rejects_unknown_tag() {
        let err = Algorithm::parse("namoa").expect_err("unknown tag");
        assert!(matches!(err, Error::UnknownAlgorithm(ref tag) if tag == "namoa"));
    }

    #[test]
    fn group_shares_everything_but_the_algorithm() {
        let cost_files = vec![PathBuf::from("d.gr"), PathBuf::from("t.gr")];
        let specs = TestSpec::group(
            &Algorithm::ALL,
            7,
            "NY",
            600,
            10,
            20,
            &PathBuf::from("out/NY-result.txt"),
            &cost_files,
        );

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].algorithm, Algorithm::Emoa);
        assert_eq!(specs[1].algorithm, Algorithm::Boa);
        for spec in &specs {
            assert_eq!(spec.test_number, 7);
            assert_eq!((spec.source, spec.target), (10, 20));
            assert_eq!(spec.cost_files, cost_files);
            assert_eq!(spec.num_dims(), 2);
        }
    }

    #[test]
    fn with_result_file_only_changes_the_path() {
        let spec = TestSpec::group(
            &[Algorithm::Boa],
            1,
            "NY",
            60,
            1,
            2,
            &PathBuf::from("a.txt"),
            &[PathBuf::from("d.gr")],
        )
        .remove(0);
        let moved = spec.with_result_file("slots/slot_0.txt");

        assert_eq!(moved.result_file, PathBuf::from("slots/slot_0.txt"));
        assert_eq!(moved.with_result_file("a.txt"), spec);
    }

    #[test]
    fn invocation_carries_spec_arguments() {
        let spec = TestSpec::group(
            &[Algorithm::Emoa],
            3,
            "grid",
            30,
            1,
            16,
            &PathBuf::from("res.txt"),
            &[PathBuf::from("m_1.gr"), PathBuf::from("m_2.gr")],
        )
        .remove(0);

        let expected: Vec<OsString> = ["1", "16", "30", "2", "m_1.gr", "m_2.gr", "res.txt"]
            .into_iter()
            .map(OsString::from)
            .collect();
        assert_eq!(spec.invocation().args(), expected);
        assert_eq!(spec.joined_cost_files(), "m_1.gr,m_2.gr");
    }
}
