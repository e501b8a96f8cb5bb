//! Benchmark harness for multi-objective shortest-path solvers.
//!
//! Builds test specifications against a fixed road map or freshly generated
//! grids, runs them concurrently through external solver executables and
//! collects the decoded reports as [`ResultRecord`]s.

mod error;
pub mod file_cleanup;
pub mod generator;
mod io;
pub mod logging;
pub mod record;
pub mod runner;
pub mod scenario;
pub mod test_spec;

pub(crate) use io::options;

pub use error::{Error, Result};
pub use io::options::{HarnessOptions, LogFormat, LogLevel, Scenario};
pub use record::{ResultRecord, sort_records};
pub use runner::{BatchOutcome, Orchestrator, OrchestratorConfig};
pub use test_spec::{Algorithm, TestSpec};
