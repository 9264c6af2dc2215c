//! Ledger anomaly detection CLI.

use anyhow::Result;
use clap::Parser;

use audit_cli::cli::{AnalyzeArgs, Cli, Command, OutputFormatArg};
use audit_cli::commands::{exit_code, run_analyze, run_profile};
use audit_cli::logging::init_logging;
use audit_cli::summary::print_report;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }

    let outcome = match &cli.command {
        Command::Analyze(args) => analyze(args),
        Command::Profile => run_profile().map(|()| 0),
    };
    let code = outcome.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        1
    });
    std::process::exit(code);
}

fn analyze(args: &AnalyzeArgs) -> Result<i32> {
    let report = run_analyze(args)?;
    match args.format {
        OutputFormatArg::Table => print_report(&report),
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(exit_code(report.risk_tier(), args.fail_on))
}
