//! # guigen-fix
//!
//! Repair a Pydantic module produced by an external JSON-Schema generator:
//! drop `extra='forbid'` directives, replace `RootModel` wrappers of the
//! configured unions with plain `Union[...]` aliases and clean up the import.
//!
//! ```bash
//! guigen-fix models_raw.py models.py
//! guigen-fix models.py models.py --config guigen.toml
//! ```

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use guigen_cli::{
    commands::run_fix,
    config::ConfigManager,
    error::CliError,
    init_tracing,
    writer::WriteResult,
};

#[derive(Parser)]
#[command(name = "guigen-fix")]
#[command(author, version, about = "Rewrite union wrapper classes in generated Pydantic code", long_about = None)]
struct Cli {
    /// Generated Pydantic module
    input: PathBuf,

    /// Rewritten module (may equal the input)
    output: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Preview the output without writing it
    #[arg(long)]
    dry_run: bool,

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
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ConfigManager::load(cli.config.as_deref())?;

    println!("{} {}", "Rewriting".cyan(), cli.input.display());
    let (report, write) = run_fix(&config, &cli.input, &cli.output, cli.dry_run)?;

    if report.directives_removed > 0 {
        println!(
            "  Removed {} extra='forbid' directive(s)",
            report.directives_removed.to_string().green()
        );
    }
    for group in &report.groups_rewritten {
        println!("  {} {} is now a union alias", "✓".green(), group);
    }
    for group in &report.groups_missing {
        println!("  {} {} wrapper not found, left unchanged", "-".dimmed(), group);
    }
    if report.import_dropped {
        println!("  Dropped unused RootModel import");
    }

    match write {
        WriteResult::Written { path, bytes } => {
            println!(
                "{} Written {} bytes to {}",
                "✓".green(),
                bytes,
                path.display()
            );
        }
        WriteResult::Unchanged { path } => {
            println!("{} {} already up to date", "✓".green(), path.display());
        }
        WriteResult::DryRun { content, path } => {
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
