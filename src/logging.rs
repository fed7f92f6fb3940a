//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set; otherwise the level follows the CLI verbosity.
//! `RUST_LOG_FORMAT=json` switches to JSON lines. Output goes to stderr so
//! stdout stays clean for track JSON.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity count (`-v`, `-vv`) or `--quiet`.
pub fn default_directive(verbosity: u8, quiet: bool) -> &'static str {
    if quiet {
        return "phonetrack=warn";
    }
    match verbosity {
        0 => "phonetrack=info",
        1 => "phonetrack=debug",
        _ => "phonetrack=trace",
    }
}

/// Initialize the global subscriber. Later calls are no-ops.
pub fn init(verbosity: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity, quiet)));

    let is_json = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbosity > 0)
        .with_thread_ids(false);

    let installed = if is_json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
