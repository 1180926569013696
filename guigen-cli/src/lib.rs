//! # guigen-cli
//!
//! CLI library for the `guigen` generator and the `guigen-fix` rewriter.
//!
//! - [`commands`] - Generate and fix runs shared by both binaries
//! - [`config`] - Configuration management and TOML parsing
//! - [`writer`] - File output and dry-run support
//! - [`error`] - Error types and handling

pub mod commands;
pub mod config;
pub mod error;
pub mod writer;

// Re-export main types for convenience
pub use commands::{run_fix, run_generate, GenerateReport, OutputMode};
pub use config::{CliArgs, Config, ConfigManager};
pub use error::{CliError, CliResult};
pub use writer::{FileWriter, WriteResult};

use tracing_subscriber::EnvFilter;

/// Install the log subscriber. `RUST_LOG` wins; otherwise `warn`, or
/// `debug` with `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // a second install (tests driving several runs) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
