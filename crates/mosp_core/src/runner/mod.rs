//! Concurrent dispatch of test specifications to the solver executables.
//!
//! Specs are shuffled, cut into batches and the batches run on a fixed-size thread
//! pool. Tests inside a batch run one after another; batches report back in
//! completion order. Every in-flight test writes its report to a result slot it
//! holds exclusively, so concurrent tests never share a result file.

mod slots;

use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc,
    },
};

use mosp_solver::process::SolverProcess;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    Error, Result,
    file_cleanup::WorkDir,
    record::ResultRecord,
    test_spec::{Algorithm, TestSpec},
};

pub use slots::{ResultSlots, SlotGuard};

pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const DEFAULT_SHUFFLE_SEED: u64 = 999;
const SLOTS_DIR: &str = "slots";

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    pub emoa_exe: PathBuf,
    pub boa_exe: PathBuf,
    /// Holds the result slots.
    pub work_dir: PathBuf,
    pub batch_size: usize,
    pub workers: usize,
    pub shuffle_seed: u64,
    /// Decode the solver's stdout summary into each record.
    pub console_summary: bool,
    /// Remove `work_dir` when the orchestrator is dropped, if it did not exist before.
    pub cleanup: bool,
}

/// What one batch produced. A batch stops at its first failing test.
#[derive(Debug)]
pub struct BatchOutcome {
    pub index: usize,
    pub test_numbers: Vec<usize>,
    pub result: Result<Vec<ResultRecord>>,
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    slots: ResultSlots,
    completed: AtomicUsize,
    _work_dir: WorkDir,
}

impl OrchestratorConfig {
    pub fn new(
        emoa_exe: impl Into<PathBuf>,
        boa_exe: impl Into<PathBuf>,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            emoa_exe: emoa_exe.into(),
            boa_exe: boa_exe.into(),
            work_dir: work_dir.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            workers: default_workers(),
            shuffle_seed: DEFAULT_SHUFFLE_SEED,
            console_summary: false,
            cleanup: true,
        }
    }

    pub fn exe_for(&self, algorithm: Algorithm) -> &Path {
        match algorithm {
            Algorithm::Emoa => &self.emoa_exe,
            Algorithm::Boa => &self.boa_exe,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::invalid_input("batch_size must be > 0"));
        }
        if self.workers == 0 {
            return Err(Error::invalid_input("workers must be > 0"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(Error::invalid_input("work_dir must not be empty"));
        }
        Ok(())
    }
}

pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let work_dir = WorkDir::prepare(&config.work_dir, config.cleanup)?;
        if config.cleanup && !work_dir.owned() {
            log::info!(
                "runner: work_dir={} already exists and will be kept",
                work_dir.path().display()
            );
        }
        let slots = ResultSlots::new(&work_dir.path().join(SLOTS_DIR), config.workers)?;

        Ok(Self {
            config,
            slots,
            completed: AtomicUsize::new(0),
            _work_dir: work_dir,
        })
    }

    /// Runs every spec and returns the records in completion order. Failed batches are
    /// logged; the first failure is returned once all batches have finished.
    #[mosp_derive::timer("runner.run_all")]
    pub fn run_all(&self, specs: Vec<TestSpec>) -> Result<Vec<ResultRecord>> {
        let total = specs.len();
        let outcomes = self.run_batches(specs)?;

        let mut records = Vec::with_capacity(total);
        let mut first_failure = None;
        for outcome in outcomes {
            match outcome.result {
                Ok(batch) => records.extend(batch),
                Err(err) => {
                    log::error!(
                        "runner.batch: failed idx={} tests={:?} err={err}",
                        outcome.index,
                        outcome.test_numbers
                    );
                    first_failure.get_or_insert(err);
                }
            }
        }

        if let Some(err) = first_failure {
            return Err(err);
        }
        log::info!("runner: complete records={}", records.len());
        Ok(records)
    }

    /// Shuffles, batches and dispatches `specs`; outcomes arrive in batch-completion order.
    pub fn run_batches(&self, mut specs: Vec<TestSpec>) -> Result<Vec<BatchOutcome>> {
        self.ensure_executables(&specs)?;

        let total = specs.len();
        specs.shuffle(&mut StdRng::seed_from_u64(self.config.shuffle_seed));
        let batches: Vec<Vec<TestSpec>> = specs
            .chunks(self.config.batch_size)
            .map(<[TestSpec]>::to_vec)
            .collect();

        log::info!(
            "runner: start tests={total} batches={} batch_size={} workers={}",
            batches.len(),
            self.config.batch_size,
            self.config.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| Error::other(format!("rayon pool: {e}")))?;

        let (tx, rx) = mpsc::channel();
        pool.scope(|scope| {
            for (index, batch) in batches.into_iter().enumerate() {
                let tx = tx.clone();
                scope.spawn(move |_| {
                    let outcome = self.run_batch(index, batch, total);
                    if tx.send(outcome).is_err() {
                        log::warn!("runner.batch: receiver gone idx={index}");
                    }
                });
            }
        });
        drop(tx);

        Ok(rx.into_iter().collect())
    }

    fn run_batch(&self, index: usize, batch: Vec<TestSpec>, total: usize) -> BatchOutcome {
        let test_numbers = batch.iter().map(|spec| spec.test_number).collect();
        log::debug!("runner.batch: start idx={index} tests={}", batch.len());

        let result = batch
            .iter()
            .map(|spec| {
                let record = self.run_single(spec)?;
                let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
                log::info!(
                    "runner.progress: done={done}/{total} test={} algorithm={}",
                    spec.test_number,
                    spec.algorithm
                );
                Ok(record)
            })
            .collect::<Result<Vec<_>>>();

        if result.is_ok() {
            log::debug!("runner.batch: done idx={index}");
        }
        BatchOutcome {
            index,
            test_numbers,
            result,
        }
    }

    /// Runs one test in a free result slot and merges its report with the spec.
    pub fn run_single(&self, spec: &TestSpec) -> Result<ResultRecord> {
        let slot = self.slots.acquire();
        let spec = spec.with_result_file(slot.path());
        let process = SolverProcess::new(self.config.exe_for(spec.algorithm));

        log::debug!(
            "runner.test: start test={} algorithm={} slot={} {}->{}",
            spec.test_number,
            spec.algorithm,
            slot.index(),
            spec.source,
            spec.target
        );

        match spec
            .invocation()
            .run(&process, self.config.console_summary)
        {
            Ok(outcome) => Ok(ResultRecord::new(spec, outcome.report, outcome.console)),
            Err(err) => Err(Error::TestFailed {
                test_number: spec.test_number,
                algorithm: spec.algorithm.to_string(),
                result_file: spec.result_file.display().to_string(),
                cost_files: spec.joined_cost_files(),
                source: Box::new(err.into()),
            }),
        }
    }

    fn ensure_executables(&self, specs: &[TestSpec]) -> Result<()> {
        for algorithm in Algorithm::ALL {
            if specs.iter().any(|spec| spec.algorithm == algorithm)
                && self.config.exe_for(algorithm).as_os_str().is_empty()
            {
                return Err(Error::invalid_input(format!(
                    "no executable configured for {algorithm}"
                )));
            }
        }
        Ok(())
    }
}
