//! Logging setup for the command-line binary.
//!
//! Uses the `log` facade with an `env_logger` backend. Level resolution,
//! highest priority first:
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. `-q/--quiet` (errors only)
//! 3. `-v` count: info, debug, trace
//! 4. Default: warnings and errors, keeping report output clean
//!
//! Debug builds log with timestamp and module path; release builds log
//! bare levels.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize the logging subsystem from the CLI verbosity flags.
///
/// Call once at startup, before any logging. An explicit `RUST_LOG` wins
/// over both flags.
///
/// # Panics
///
/// Panics if called more than once; `env_logger` installs a process-wide
/// logger.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    apply_format(&mut builder);
    builder.init();

    log::debug!("Logging initialized at {:?}", log::max_level());
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn apply_format(builder: &mut Builder) {
    #[cfg(debug_assertions)]
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{} {style}{:<5}{style:#} [{}] {}",
            buf.timestamp_seconds(),
            record.level(),
            record.module_path().unwrap_or("?"),
            record.args()
        )
    });

    #[cfg(not(debug_assertions))]
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(
            buf,
            "{style}{:<5}{style:#} {}",
            record.level(),
            record.args()
        )
    });
}
