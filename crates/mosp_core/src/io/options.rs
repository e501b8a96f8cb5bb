use std::{
    env,
    path::{Path, PathBuf},
    process,
};

use log::LevelFilter;
use mosp_derive::{CliOptions, CliValue, KvDisplay};

use crate::{
    Error, Result,
    runner::{self, OrchestratorConfig},
    scenario::{
        DEFAULT_TIME_LIMIT, FixedMapScenario, GridScenario, GridShape, GridSweep, NY_NUM_VERTICES,
    },
    test_spec::Algorithm,
};

const DEFAULT_NUM_TESTS: usize = 50;
const DEFAULT_SEED: u64 = 999;
const DEFAULT_MAP_LABEL: &str = "NY";
const DEFAULT_COST_FILES: [&str; 2] = ["USA-road-d.NY.gr", "USA-road-t.NY.gr"];

/// Command-line options of the benchmark harness.
#[derive(Clone, Debug, CliOptions, KvDisplay)]
pub struct HarnessOptions {
    /// EMOA* solver executable.
    #[cli(long = "emoa-exe")]
    #[kv(fmt = "path")]
    pub emoa_exe: PathBuf,
    /// BOA* solver executable.
    #[cli(long = "boa-exe")]
    #[kv(fmt = "path")]
    pub boa_exe: PathBuf,
    /// Holds the per-worker result slots.
    #[cli(long = "work-dir")]
    #[kv(fmt = "path")]
    pub work_dir: PathBuf,
    /// Road maps and generated grids live here.
    #[cli(long = "data-dir")]
    #[kv(fmt = "path")]
    pub data_dir: PathBuf,
    #[cli(long = "scenario", parse_with = "Scenario::parse")]
    pub scenario: Scenario,
    #[cli(long = "algorithms", parse_with = "Algorithm::parse", list)]
    #[kv(fmt = "list")]
    pub algorithms: Vec<Algorithm>,
    /// Tests per scenario, or per grid combination.
    #[cli(long = "num-tests")]
    pub num_tests: usize,
    /// Seeds endpoint draws, grid generation and the dispatch shuffle.
    #[cli(long = "seed")]
    pub seed: u64,
    #[cli(long = "batch-size")]
    pub batch_size: usize,
    #[cli(long = "workers")]
    pub workers: usize,
    /// Seconds, forwarded to the solver.
    #[cli(long = "time-limit")]
    pub time_limit: u64,
    #[cli(long = "map-label")]
    pub map_label: String,
    /// Fixed-map cost layers. Empty means the NY distance and time layers in `data_dir`.
    #[cli(long = "cost-files", list)]
    #[kv(fmt = "paths")]
    pub cost_files: Vec<PathBuf>,
    #[cli(long = "num-vertices")]
    pub num_vertices: u64,
    /// Append a degree-derived layer built from the first cost file.
    pub degree_dim: bool,
    #[cli(long = "grid-shapes", parse_with = "GridShape::parse", list)]
    #[kv(fmt = "list")]
    pub grid_shapes: Vec<GridShape>,
    #[cli(long = "walls-ratios", list)]
    #[kv(fmt = "list")]
    pub walls_ratios: Vec<f64>,
    /// Grid weights are drawn from `1..weight_range`.
    #[cli(long = "weight-range")]
    pub weight_range: u64,
    /// Decode node/edge counts and phase timings from solver stdout.
    pub console_summary: bool,
    /// Remove the work directory after the run if this run created it.
    pub cleanup: bool,
    #[cli(long = "log-level", parse_with = "LogLevel::parse")]
    pub log_level: LogLevel,
    #[cli(long = "log-format", parse_with = "LogFormat::parse")]
    pub log_format: LogFormat,
    pub log_timestamp: bool,
    /// Empty or `-` means stderr.
    #[cli(long = "log-output")]
    pub log_output: String,
    /// Record table destination. Empty or `-` means stdout.
    #[cli(long = "output")]
    pub output: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "scenario")]
pub enum Scenario {
    #[cli(alias = "ny")]
    FixedMap,
    #[cli(alias = "simple-map")]
    Grid,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-level")]
pub enum LogLevel {
    Error,
    #[cli(alias = "warning")]
    Warn,
    Info,
    Debug,
    Trace,
    Off,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
            Self::Trace => LevelFilter::Trace,
            Self::Off => LevelFilter::Off,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, CliValue)]
#[cli_value(option = "log-format")]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            emoa_exe: PathBuf::from("run_emoa"),
            boa_exe: PathBuf::from("run_boalex"),
            work_dir: default_work_dir(),
            data_dir: PathBuf::from("data"),
            scenario: Scenario::FixedMap,
            algorithms: Algorithm::ALL.to_vec(),
            num_tests: DEFAULT_NUM_TESTS,
            seed: DEFAULT_SEED,
            batch_size: runner::DEFAULT_BATCH_SIZE,
            workers: runner::default_workers(),
            time_limit: DEFAULT_TIME_LIMIT,
            map_label: DEFAULT_MAP_LABEL.to_string(),
            cost_files: Vec::new(),
            num_vertices: NY_NUM_VERTICES,
            degree_dim: false,
            grid_shapes: vec![GridShape::new(3, 15, 15)],
            walls_ratios: vec![0.0],
            weight_range: crate::generator::grid::DEFAULT_WEIGHT_RANGE,
            console_summary: false,
            cleanup: true,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            log_timestamp: true,
            log_output: String::new(),
            output: String::new(),
        }
    }
}

impl HarnessOptions {
    pub fn from_args() -> Result<Self> {
        Self::parse_from_iter(env::args().skip(1))
    }

    pub fn parse_from_iter<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut options = Self::default();
        let mut args = args
            .into_iter()
            .map(|arg| arg.as_ref().to_owned())
            .peekable();

        while let Some(arg) = args.next() {
            if arg == "--help" || arg == "-h" {
                return Err(Error::invalid_input(Self::usage()));
            }

            let Some(raw_name) = arg.strip_prefix("--") else {
                return Err(Error::invalid_input(format!(
                    "Unexpected argument: {arg}\n\n{}",
                    Self::usage()
                )));
            };
            if raw_name.is_empty() {
                return Err(Error::invalid_input(format!(
                    "Invalid option name: {arg}\n\n{}",
                    Self::usage()
                )));
            }

            let (name, value) = Self::split_arg(raw_name, &mut args);
            if options.apply_cli_option(&name, value.clone())? {
                continue;
            }

            let (flag, enabled) = match name.strip_prefix("no-") {
                Some(flag) => (flag, false),
                None => (name.as_str(), true),
            };
            let target = match flag {
                "degree-dim" => &mut options.degree_dim,
                "console-summary" => &mut options.console_summary,
                "cleanup" => &mut options.cleanup,
                "log-timestamp" => &mut options.log_timestamp,
                _ => {
                    return Err(Error::invalid_input(format!(
                        "Unknown option: --{name}\n\n{}",
                        Self::usage()
                    )));
                }
            };
            *target = flag_value(&name, value, enabled)?;
        }

        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.num_tests == 0 {
            return Err(Error::invalid_input("--num-tests must be > 0"));
        }
        if self.algorithms.is_empty() {
            return Err(Error::invalid_input("--algorithms must name at least one algorithm"));
        }
        if let Some(ratio) = self
            .walls_ratios
            .iter()
            .find(|ratio| !(0.0..=1.0).contains(*ratio))
        {
            return Err(Error::invalid_input(format!(
                "--walls-ratios values must be within [0, 1], got {ratio}"
            )));
        }
        Ok(())
    }

    pub fn usage() -> &'static str {
        concat!(
            "Usage:\n",
            "  mosp-bench [options]\n\n",
            "Options:\n",
            "  --emoa-exe <path>\n",
            "  --boa-exe <path>\n",
            "  --work-dir <path>\n",
            "  --data-dir <path>\n",
            "  --scenario <fixed-map|grid>\n",
            "  --algorithms <emoa,boa>\n",
            "  --num-tests <usize>\n",
            "  --seed <u64>\n",
            "  --batch-size <usize>\n",
            "  --workers <usize>\n",
            "  --time-limit <seconds>\n",
            "  --map-label <name>\n",
            "  --cost-files <path,path,...>\n",
            "  --num-vertices <u64>\n",
            "  --degree-dim[=<bool>]\n",
            "  --no-degree-dim\n",
            "  --grid-shapes <DIMSxWIDTHxHEIGHT,...>\n",
            "  --walls-ratios <f64,...>\n",
            "  --weight-range <u64>\n",
            "  --console-summary[=<bool>]\n",
            "  --no-console-summary\n",
            "  --cleanup[=<bool>]\n",
            "  --no-cleanup\n",
            "  --log-level <error|warn|info|debug|trace|off>\n",
            "  --log-format <compact|pretty>\n",
            "  --log-timestamp[=<bool>]\n",
            "  --no-log-timestamp\n",
            "  --log-output <path>\n",
            "  --output <path>\n",
            "  --help\n",
            "\n",
            "Examples:\n",
            "  mosp-bench --emoa-exe ./run_emoa --boa-exe ./run_boalex --num-tests 50 --workers 4\n",
            "  mosp-bench --scenario grid --grid-shapes 3x15x15,4x15x15 --walls-ratios 0,0.2\n",
            "  mosp-bench --degree-dim --console-summary --output results.tsv\n",
        )
    }

    pub fn log_output_path(&self) -> Option<&Path> {
        optional_path(&self.log_output)
    }

    pub fn output_path(&self) -> Option<&Path> {
        optional_path(&self.output)
    }

    /// Explicit `--cost-files`, or the default NY layers inside `data_dir`.
    pub fn fixed_map_cost_files(&self) -> Vec<PathBuf> {
        if self.cost_files.is_empty() {
            DEFAULT_COST_FILES
                .iter()
                .map(|name| self.data_dir.join(name))
                .collect()
        } else {
            self.cost_files.clone()
        }
    }

    /// `<stem>-deg.gr` next to the first cost file.
    pub fn degree_layer_path(&self) -> Option<PathBuf> {
        let base = self.fixed_map_cost_files().into_iter().next()?;
        let stem = base.file_stem()?.to_string_lossy().into_owned();
        Some(base.with_file_name(format!("{stem}-deg.gr")))
    }

    pub fn fixed_map_scenario(&self, cost_files: Vec<PathBuf>) -> FixedMapScenario {
        FixedMapScenario {
            num_vertices: self.num_vertices,
            time_limit: self.time_limit,
            algorithms: self.algorithms.clone(),
            ..FixedMapScenario::new(&self.map_label, cost_files)
        }
    }

    pub fn grid_sweep(&self) -> GridSweep {
        let mut sweep = GridSweep::new(
            self.grid_shapes.clone(),
            self.walls_ratios.clone(),
            &self.data_dir,
        );
        sweep.base = GridScenario {
            weight_range: self.weight_range,
            time_limit: self.time_limit,
            algorithms: self.algorithms.clone(),
            ..sweep.base
        };
        sweep
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            batch_size: self.batch_size,
            workers: self.workers,
            shuffle_seed: self.seed,
            console_summary: self.console_summary,
            cleanup: self.cleanup,
            ..OrchestratorConfig::new(&self.emoa_exe, &self.boa_exe, &self.work_dir)
        }
    }
}

fn optional_path(raw: &str) -> Option<&Path> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        None
    } else {
        Some(Path::new(raw))
    }
}

fn default_work_dir() -> PathBuf {
    env::temp_dir().join(format!("mosp-bench-{}", process::id()))
}

/// `--flag`, `--flag=<bool>` or `--no-flag`; the negated form takes no value.
fn flag_value(name: &str, value: Option<String>, enabled: bool) -> Result<bool> {
    match (value, enabled) {
        (None, enabled) => Ok(enabled),
        (Some(raw), true) => parse_bool(name, &raw),
        (Some(_), false) => Err(Error::invalid_input(format!(
            "Flag --{name} does not take a value"
        ))),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::invalid_input(format!(
            "Invalid boolean for --{name}: {value} (expected true/false)"
        ))),
    }
}
