//! Logger bootstrap for the harness binary and tests.
use env_logger::{Builder, Env};
use log::LevelFilter;

/// Level used when `RUST_LOG` is unset.
#[must_use]
pub const fn default_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Initializes the global logger.
///
/// `RUST_LOG` wins when set; otherwise resolver and turn diagnostics are
/// shown at [`default_level`].
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_level(verbose).to_string());
    let mut builder = Builder::from_env(env);
    builder.format_timestamp_millis();

    // A second `init` (common across integration tests) is a no-op.
    if builder.try_init().is_err() {
        log::trace!("logger already initialised");
    }
}
