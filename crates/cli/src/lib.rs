pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fieldquote",
    about = "Fieldquote operator CLI",
    long_about = "Price natural-language service requests against a catalog, inspect catalog \
                  files, and run offline smoke validation.",
    after_help = "Examples:\n  fieldquote quote \"45 square feet of mulch\"\n  fieldquote catalog --catalog services.toml\n  fieldquote smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run one customer message through the quote pipeline")]
    Quote(commands::quote::QuoteArgs),
    #[command(about = "Load and validate a catalog file, listing every service")]
    Catalog(commands::catalog::CatalogArgs),
    #[command(about = "Run end-to-end pricing checks with per-check timing details")]
    Smoke,
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Quote(args) => commands::quote::run(&args),
        Command::Catalog(args) => commands::catalog::run(&args),
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays parseable command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
