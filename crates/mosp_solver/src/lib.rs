//! `mosp_solver` is a typed Rust API around multi-objective shortest-path solver
//! binaries (EMOA*, BOA*-style executables):
//! - write and read the `.gr` edge-list cost files they consume,
//! - invoke a solver as a child process with its positional CLI,
//! - decode the fixed-format result file and the console summary it prints.
//!
//! # Quickstart
//!
//! ```no_run
//! use mosp_solver::{process::SolverProcess, solver::SolverInvocation};
//!
//! fn main() -> mosp_solver::SolverResult<()> {
//!     let invocation = SolverInvocation::new(
//!         1,
//!         5000,
//!         600,
//!         vec!["data/NY-d.gr".into(), "data/NY-t.gr".into()],
//!         "out/result.txt",
//!     );
//!     let outcome = invocation.run(&SolverProcess::new("/opt/emoa/run_emoa"), false)?;
//!     println!("{} solutions", outcome.report.num_solutions);
//!     Ok(())
//! }
//! ```

pub mod console;
pub mod graph;
pub mod process;
pub mod report;
pub mod solver;

mod error;
mod line_writer;

pub use error::{SolverError, SolverResult};
