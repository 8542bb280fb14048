//! # schoning
//!
//! `schoning` is a command-line 3-SAT solver built on Schöning's randomized
//! local search. It reads a problem in a DIMACS-like layout, runs one or more
//! random walks over it, and can log every step of each walk.
//!
//! ## Input format
//!
//! - Line 1 is a placeholder (usually a `c` comment).
//! - Line 2 is the header, `p cnf <variables> <clauses>`.
//! - Each further line is a clause of signed literals terminated by `0`.
//! - A lone `%` line ends the clause list.
//!
//! ## Usage
//!
//! ```sh
//! schoning [OPTIONS] [PATH]
//! schoning file --path <PROBLEM> [OPTIONS]
//! schoning text --input "c\np cnf 2 2\n1 -2 0\n2 0" [OPTIONS]
//! schoning dir --path <DIRECTORY> [OPTIONS]
//! schoning completions <SHELL>
//! ```
//!
//! ### Common options
//!
//! -   `-d, --debug`: Print the parsed formula and log at debug level.
//! -   `-v`: Raise log verbosity; repeat for more. `RUST_LOG` overrides it.
//! -   `--seed <N>`: Seed the random source for a reproducible run.
//! -   `--flips-per-variable <K>`: Walk length as a multiple of the variable count (default 3).
//! -   `--max-flips <N>`: Fixed walk length, overriding the multiple.
//! -   `--strategy <uniform|clause>`: How the variable to flip is chosen.
//! -   `--restarts <N>`: Independent walks to try (default 1).
//! -   `--trace-dir <DIR>`: Write a `solution_<file>` step log per walk.
//! -   `--series`: Also write `graph_solution_<file>.dat` chart data.
//! -   `-p, --print-solution`: Print the satisfying assignment.
//! -   `--no-verify`, `--no-stats`: Skip verification or the statistics table.
//! -   `--keep-wide-clauses`: Do not drop the first token of clause lines wider than four tokens.
//!
//! ## Example Invocations
//!
//! ```sh
//! # Solve a problem with a fixed seed and print the model
//! schoning problems/uf20-01.txt --seed 42 -p
//!
//! # Log every step and the chart data for each walk
//! schoning file --path problems/uf20-01.txt --trace-dir solutions --series
//!
//! # Try up to 50 classic clause-directed walks on every problem in a directory
//! schoning dir --path problems --strategy clause --restarts 50
//! ```

use crate::command_line::cli::{Cli, Commands, solve_dir, solve_path, solve_text};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod command_line;

/// Global allocator using `tikv-jemallocator` for potentially better performance
/// and memory usage tracking.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

/// Main entry point.
///
/// Parses command-line arguments, installs the log subscriber and dispatches
/// to the appropriate command handler.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let common = cli.active_options();
    init_logging(common.verbose, common.debug);

    match cli.command {
        Some(Commands::File { path, common }) => solve_path(&path, &common),
        Some(Commands::Text { input, common }) => solve_text(&input, &common),
        Some(Commands::Dir { path, common }) => solve_dir(&path, &common),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "schoning",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        None => match cli.path {
            Some(path) => solve_path(&path, &cli.common),
            None => {
                eprintln!("No command provided. Use --help for more information.");
                std::process::exit(1);
            }
        },
    }
}

fn init_logging(verbose: u8, debug: bool) {
    let level = match (debug, verbose) {
        (false, 0) => "warn",
        (false, 1) => "info",
        (true, 0 | 1) | (_, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
