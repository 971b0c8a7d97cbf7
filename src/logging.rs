//! Logger setup for the binaries
//!
//! The library only talks to the `log` facade. Binaries call
//! [`init_logging`] once; `RUST_LOG` takes precedence over the CLI flags.

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Install `env_logger` on stderr
///
/// `quiet` keeps errors only; otherwise `verbose` 0/1/2+ selects
/// info/debug/trace. A second call is a no-op.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let style = buf.default_level_style(level);
        if verbose >= 1 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_millis(),
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(buf, "{style}{:<5}{style:#} {}", level, record.args())
        }
    });

    if builder.try_init().is_ok() {
        log::debug!("logging initialised at {:?}", log::max_level());
    }
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0, false), LevelFilter::Info);
        assert_eq!(level_for(1, false), LevelFilter::Debug);
        assert_eq!(level_for(5, false), LevelFilter::Trace);
        assert_eq!(level_for(2, true), LevelFilter::Error);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(0, true);
        init_logging(2, false);
    }
}
