//! Error types for the CLI.
//!
//! Library phase errors are wrapped as-is; configuration, output and
//! `--check` failures are defined here.

use std::path::PathBuf;
use thiserror::Error;

use guigen::{GenerateError, RewriteError, SchemaError};

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to load schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to generate code: {0}")]
    Generate(#[from] GenerateError),

    #[error("Failed to rewrite file: {0}")]
    Rewrite(#[from] RewriteError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),

    /// `--check` found no generated file to compare against.
    #[error("{} has not been generated yet", path.display())]
    MissingOutput { path: PathBuf },

    /// `--check` found a generated file that differs from a fresh run.
    #[error("{} is out of date", path.display())]
    OutOfDate { path: PathBuf },

    /// Argument combinations clap does not reject by itself.
    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code: 2 when `--check` fails, 1 for everything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::MissingOutput { .. } | CliError::OutOfDate { .. } => 2,
            _ => 1,
        }
    }

    /// True for the two `--check` outcomes.
    pub fn is_check_failure(&self) -> bool {
        self.exit_code() == 2
    }
}

/// Problems with `guigen.toml` or the values it carries.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// A value parsed but cannot be used, e.g. an incomplete `emit.sections`.
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn not_found(path: PathBuf) -> Self {
        Self::NotFound { path }
    }

    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Failure to put a generated or rewritten file in place.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Staging or renaming the new content failed; the old file is intact.
    #[error("Failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
