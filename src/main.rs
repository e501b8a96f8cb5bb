use std::{
    fs::File,
    io::{self, BufWriter, Write},
    process::ExitCode,
    time::Instant,
};

use log::info;
use rand::{SeedableRng, rngs::StdRng};

use mosp_core::{
    Error, HarnessOptions, Orchestrator, Result, ResultRecord, Scenario, TestSpec, generator,
    logging, sort_records,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let now = Instant::now();
    let options = HarnessOptions::from_args()?;
    logging::init_logger(&options)?;
    info!("options: {options}");

    let specs = build_specs(&options)?;
    let orchestrator = Orchestrator::new(options.orchestrator_config())?;
    let mut records = orchestrator.run_all(specs)?;
    sort_records(&mut records);

    write_records(&options, &records)?;
    info!(
        "output: records={} time={:.2}s",
        records.len(),
        now.elapsed().as_secs_f32()
    );
    Ok(())
}

fn build_specs(options: &HarnessOptions) -> Result<Vec<TestSpec>> {
    let mut rng = StdRng::seed_from_u64(options.seed);

    match options.scenario {
        Scenario::FixedMap => {
            let mut cost_files = options.fixed_map_cost_files();
            if options.degree_dim {
                let (Some(base), Some(output)) =
                    (cost_files.first().cloned(), options.degree_layer_path())
                else {
                    return Err(Error::invalid_input(
                        "--degree-dim needs at least one cost file",
                    ));
                };
                cost_files.push(generator::write_degree_layer(&base, &output)?);
            }
            options
                .fixed_map_scenario(cost_files)
                .build(options.num_tests, 1, &mut rng)
        }
        Scenario::Grid => options.grid_sweep().build(options.num_tests, 1, &mut rng),
    }
}

fn write_records(options: &HarnessOptions, records: &[ResultRecord]) -> Result<()> {
    let mut out: Box<dyn Write> = match options.output_path() {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    writeln!(out, "{}", ResultRecord::header())?;
    for record in records {
        writeln!(out, "{record}")?;
    }
    out.flush()?;
    Ok(())
}
