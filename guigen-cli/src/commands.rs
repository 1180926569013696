//! Command implementations shared by the binaries.
//!
//! Each command runs the whole pipeline in memory and touches the output
//! path once at the end; printing is left to the binaries.

use std::path::Path;

use guigen::{generate, generator_for, load_file, GeneratedUnit, RewriteReport};

use crate::config::Config;
use crate::error::{CliError, CliResult};
use crate::writer::{FileWriter, WriteResult};

/// What to do with generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Write the output file.
    #[default]
    Write,
    /// Return the content without writing.
    DryRun,
    /// Compare with the existing output file.
    Check,
}

/// Result of a generate run.
#[derive(Debug)]
pub struct GenerateReport {
    pub unit: GeneratedUnit,

    /// `None` in check mode.
    pub write: Option<WriteResult>,
}

/// Load `schema`, generate for the configured target and handle `output`
/// according to `mode`.
pub fn run_generate(
    config: &Config,
    schema: &Path,
    output: &Path,
    mode: OutputMode,
) -> CliResult<GenerateReport> {
    let generator_config = config.to_generator_config()?;
    let table = load_file(schema, &config.schema_root_fallback())?;

    let generator = generator_for(config.output.target);
    tracing::debug!(
        target_id = generator.id(),
        schema = %schema.display(),
        definitions = table.len(),
        "generating"
    );
    let unit = generate(&table, generator.as_ref(), &generator_config)?;

    let write = match mode {
        OutputMode::Check => {
            check_up_to_date(output, &unit.content)?;
            None
        }
        OutputMode::Write | OutputMode::DryRun => {
            let writer = FileWriter::new(mode == OutputMode::DryRun);
            Some(writer.write(output, &unit.content)?)
        }
    };

    Ok(GenerateReport { unit, write })
}

fn check_up_to_date(output: &Path, content: &str) -> CliResult<()> {
    if !output.exists() {
        return Err(CliError::MissingOutput {
            path: output.to_path_buf(),
        });
    }

    let existing = std::fs::read_to_string(output)?;
    if existing.trim_end() == content.trim_end() {
        Ok(())
    } else {
        Err(CliError::OutOfDate {
            path: output.to_path_buf(),
        })
    }
}

/// Rewrite `input` with the configured groups and write the result to
/// `output` (which may be the same file).
pub fn run_fix(
    config: &Config,
    input: &Path,
    output: &Path,
    dry_run: bool,
) -> CliResult<(RewriteReport, WriteResult)> {
    let rewriter = config.to_rewriter()?;
    let (content, report) = rewriter.rewrite_file(input)?;
    let write = FileWriter::new(dry_run).write(output, &content)?;
    Ok((report, write))
}
