use mosp_solver::SolverError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown algorithm '{0}' (expected emoa|boa)")]
    UnknownAlgorithm(String),
    #[error("generation invariant violated: {0}")]
    GenerationInvariant(String),
    #[error(
        "test {test_number} [{algorithm}] failed (result_file={result_file}, cost_files={cost_files}): {source}"
    )]
    TestFailed {
        test_number: usize,
        algorithm: String,
        result_file: String,
        cost_files: String,
        source: Box<Error>,
    },
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationInvariant(message.into())
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}
