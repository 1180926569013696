//! # guigen
//!
//! Generate Pydantic models or Zod schemas from a UI schema document.
//!
//! ## Usage
//!
//! ```bash
//! # Pydantic models
//! guigen ui-schema.json generated/ui_schema.py
//!
//! # Zod schemas
//! guigen ui-schema.json generated/ui-schema.ts --target zod
//!
//! # Preview without writing
//! guigen ui-schema.json generated/ui_schema.py --dry-run
//!
//! # Pin the version marker and keep strict records strict
//! guigen ui-schema.json generated/ui_schema.py --version-marker 2.0.0 --forbid-extra
//!
//! # Fail (exit 2) when the generated file is out of date
//! guigen ui-schema.json generated/ui_schema.py --check
//!
//! # Start a configuration file
//! guigen --print-config > guigen.toml
//! ```

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use guigen::Target;
use guigen_cli::{
    commands::{run_generate, OutputMode},
    config::{CliArgs, ConfigManager},
    error::CliError,
    init_tracing,
    writer::WriteResult,
};

#[derive(Parser)]
#[command(name = "guigen")]
#[command(author, version, about = "Generate Pydantic models or Zod schemas from a UI schema", long_about = None)]
struct Cli {
    /// Schema document (JSON)
    #[arg(required_unless_present = "print_config")]
    schema: Option<PathBuf>,

    /// Generated source file
    #[arg(required_unless_present = "print_config")]
    output: Option<PathBuf>,

    /// Target backend (pydantic, zod)
    #[arg(short, long)]
    target: Option<Target>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Version marker written into the header (overrides the schema's version)
    #[arg(long, value_name = "VERSION")]
    version_marker: Option<String>,

    /// Leave descriptions out of the generated code
    #[arg(long)]
    no_docs: bool,

    /// Emit `extra="forbid"` for records that disallow additional properties
    #[arg(long)]
    forbid_extra: bool,

    /// Preview the output without writing it
    #[arg(long, conflicts_with = "check")]
    dry_run: bool,

    /// Compare with the existing output instead of writing it
    #[arg(long)]
    check: bool,

    /// Print a commented default configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    if cli.print_config {
        print!("{}", ConfigManager::default_config_content());
        return Ok(());
    }
    let (Some(schema), Some(output)) = (cli.schema, cli.output) else {
        return Err(CliError::Usage(
            "both <SCHEMA> and <OUTPUT> are required".to_string(),
        ));
    };

    let config = ConfigManager::load(cli.config.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            target: cli.target,
            version: cli.version_marker,
            generate_docs: cli.no_docs.then_some(false),
            forbid_extra: cli.forbid_extra.then_some(true),
        },
    );

    let mode = if cli.check {
        OutputMode::Check
    } else if cli.dry_run {
        OutputMode::DryRun
    } else {
        OutputMode::Write
    };

    println!(
        "{} {} ({})",
        "Generating from".cyan(),
        schema.display(),
        config.output.target
    );

    let report = run_generate(&config, &schema, &output, mode)?;

    println!(
        "  Emitted {} declaration(s)",
        report.unit.declarations.len().to_string().green()
    );
    for substitution in &report.unit.substitutions {
        println!(
            "  {}.{}: {} typed as list of {}",
            substitution.owner, substitution.field, substitution.alias, substitution.record
        );
    }

    match report.write {
        None => {
            println!("{} {} is up-to-date", "✓".green(), output.display());
        }
        Some(WriteResult::Written { path, bytes }) => {
            println!(
                "{} Written {} bytes to {}",
                "✓".green(),
                bytes,
                path.display()
            );
        }
        Some(WriteResult::Unchanged { path }) => {
            println!("{} {} already up to date", "✓".green(), path.display());
        }
        Some(WriteResult::DryRun { content, path }) => {
            println!(
                "{} Would write to {}:",
                "[dry-run]".yellow(),
                path.display()
            );
            println!("{}", "─".repeat(60).dimmed());
            print!("{}", content);
            println!("{}", "─".repeat(60).dimmed());
        }
    }

    Ok(())
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
    if error.is_check_failure() {
        eprintln!("  Run 'guigen' without --check to update");
    }
}
