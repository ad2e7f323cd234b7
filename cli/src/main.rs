//! sheetjson CLI - print the first sheet of a workbook as JSON records
//!
//! Reads `zongce.xlsx` from the working directory (or the given path) and
//! writes a single JSON array to stdout. Diagnostics go to stderr only.

use clap::Parser;
use colored::*;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Print the first sheet of an Excel workbook as a JSON array of records
#[derive(Parser)]
#[command(
    name = "sheetjson",
    version,
    about = "Print the first sheet of an Excel workbook as JSON records",
    long_about = "sheetjson - Excel to JSON records.\n\n\
                  Reads the first sheet of the workbook, uses its first row as the\n\
                  header and prints every following row as a JSON object."
)]
struct Cli {
    /// Input workbook path
    #[arg(default_value = sheetjson::DEFAULT_INPUT)]
    input: PathBuf,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Render fully before writing so a failure leaves stdout untouched
    let json = sheetjson::convert(&cli.input)?;
    write_output(&json)?;
    Ok(())
}

fn write_output(content: &str) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", content)?;
    handle.flush()
}
