mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::investment::{AnalyzeArgs, ScenariosArgs};
use commands::time_value::{IrrArgs, MortgageArgs};

/// Rental property investment analysis
#[derive(Parser)]
#[command(
    name = "rra",
    version,
    about = "Rental property investment analysis",
    long_about = "A CLI for analysing a single rental property with decimal precision. \
                  Computes mortgage payment, monthly and annual cashflow, sale value, \
                  ROI and IRR, and runs rent, vacancy and rate stress scenarios."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log calculation steps to stderr (otherwise RUST_LOG applies)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a property: financing, cashflow, sale value, ROI and IRR
    Analyze(AnalyzeArgs),
    /// Run the rent, vacancy and rate stress scenarios
    Scenarios(ScenariosArgs),
    /// Monthly payment for a fixed-rate amortizing loan
    Mortgage(MortgageArgs),
    /// Internal rate of return of a cash flow series
    Irr(IrrArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::investment::run_analyze(args),
        Commands::Scenarios(args) => commands::investment::run_scenarios(args),
        Commands::Mortgage(args) => commands::time_value::run_mortgage(args),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Version => {
            println!("rra {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
