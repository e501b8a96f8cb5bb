use std::{fs::File, io::Write};

use env_logger::{Builder, Target, WriteStyle, fmt::Formatter};
use log::Level;

use crate::{
    Error, Result,
    options::{HarnessOptions, LogFormat},
};

/// Installs the global logger. Fails if a logger is already set.
pub fn init_logger(options: &HarnessOptions) -> Result<()> {
    let log_format = options.log_format;
    let log_timestamp = options.log_timestamp;

    let mut builder = Builder::new();
    builder
        .filter_level(options.log_level.to_filter())
        .write_style(WriteStyle::Never)
        .format(move |buf: &mut Formatter, record| {
            if log_timestamp {
                write!(buf, "{} ", buf.timestamp_millis())?;
            }

            let tag = level_tag(record.level());
            match log_format {
                LogFormat::Compact => writeln!(buf, "{tag} {}", record.args()),
                LogFormat::Pretty => {
                    writeln!(buf, "{tag} [{}] {}", record.target(), record.args())
                }
            }
        });

    match options.log_output_path() {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::other(format!("log output {}: {e}", path.display()))
            })?;
            builder.target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.target(Target::Stderr);
        }
    }

    builder
        .try_init()
        .map_err(|e| Error::other(format!("logger init failed: {e}")))
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
