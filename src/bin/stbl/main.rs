#![warn(missing_docs)]
//! The `stbl` binary fits the branch lengths of a supertree topology from
//! the command line, using the [`stbl`] crate.

use std::error::Error;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use env_logger::Env;
use stbl::config::{FitConfig, SolverKind};
use stbl::run::run;

/// contains the struct representing the command line arguments
/// parsed by [`clap`] and used to execute this binary
pub mod cli;

fn report_error(err: &dyn Error) {
    eprintln!("Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let args = cli::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match args.command {
        cli::Commands::Fit {
            sources,
            source_format,
            topology,
            topology_format,
            solver,
            solver_timeout,
            tolerance,
            max_sweeps,
            weights,
            negative,
            output,
            print,
            quiet,
        } => {
            let solver = match solver {
                Some(executable) => SolverKind::External {
                    executable: Some(executable),
                    timeout: Duration::from_secs(solver_timeout),
                },
                None => SolverKind::InProcess {
                    tolerance,
                    max_sweeps,
                },
            };

            let mut config = FitConfig::new()
                .source_format(source_format)
                .topology_format(topology_format)
                .solver(solver)
                .weight_policy(weights)
                .negative_lengths(negative)
                .show_progress(!quiet);
            config.source_trees = sources;
            config.topology = topology;
            config.output_dir = output;

            match run(&config) {
                Ok(outputs) => {
                    log::info!("Run description written to {}", outputs.report.display());
                    if print {
                        if let Err(err) = outputs.supertree.print() {
                            report_error(&err);
                            return ExitCode::FAILURE;
                        }
                    }
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    report_error(&err);
                    ExitCode::FAILURE
                }
            }
        }
        cli::Commands::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            ExitCode::SUCCESS
        }
    }
}
