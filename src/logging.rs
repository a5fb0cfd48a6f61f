use std::io::IsTerminal;

use anyhow::anyhow;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const CRATE_TARGET: &str = "attendance_calendar";

/// Default filter directives for `-v`/`-q` counts. Verbosity raises this
/// crate's level only; dependencies (sqlx, tokio) stay at `warn` until
/// `-vvv`. `RUST_LOG` replaces the whole filter when set.
pub fn default_filter(verbose: u8, quiet: u8) -> String {
    match (quiet, verbose) {
        (q, _) if q >= 2 => "error".to_string(),
        (1, _) => "warn".to_string(),
        (_, 0) => "warn".to_string(),
        (_, 1) => format!("warn,{CRATE_TARGET}=info"),
        (_, 2) => format!("warn,{CRATE_TARGET}=debug"),
        _ => format!("info,{CRATE_TARGET}=trace"),
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let directives = default_filter(verbose, quiet);
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&directives)
            .map_err(|e| anyhow!("invalid default log filter {directives:?}: {e}"))?,
    };

    let init_result = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(default_filter(3, 2), "error");
        assert_eq!(default_filter(3, 1), "warn");
    }

    #[test]
    fn verbosity_scopes_to_this_crate() {
        assert_eq!(default_filter(0, 0), "warn");
        assert_eq!(default_filter(1, 0), "warn,attendance_calendar=info");
        assert_eq!(default_filter(2, 0), "warn,attendance_calendar=debug");
        assert_eq!(default_filter(5, 0), "info,attendance_calendar=trace");
    }

    #[test]
    fn default_filters_parse() {
        for verbose in 0..4 {
            for quiet in 0..3 {
                let directives = default_filter(verbose, quiet);
                assert!(
                    EnvFilter::try_new(&directives).is_ok(),
                    "{directives} should parse"
                );
            }
        }
    }
}
