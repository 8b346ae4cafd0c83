use std::io::IsTerminal;

use anyhow::anyhow;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the global `fmt` subscriber. `RUST_LOG` wins, then `-v`/`-q` flags, then
/// the configured filter, then `warn`.
pub fn init_tracing(verbose: u8, quiet: u8, configured: Option<&str>) -> anyhow::Result<()> {
    let flag_level = if quiet >= 2 {
        Some("error")
    } else if quiet == 1 {
        Some("warn")
    } else if verbose >= 3 {
        Some("trace")
    } else if verbose == 2 {
        Some("debug")
    } else if verbose == 1 {
        Some("info")
    } else {
        None
    };
    let default_directive = flag_level.or(configured).unwrap_or("warn");

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
