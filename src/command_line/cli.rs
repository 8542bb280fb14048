#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use schoning::sat::cnf::Formula;
use schoning::sat::dimacs::{ParseOptions, parse_dimacs, parse_file};
use schoning::sat::evaluator::evaluate;
use schoning::sat::schoning::{
    DEFAULT_FLIPS_PER_VARIABLE, FlipStrategy, IterationBudget, Search, SearchConfig,
    SearchOutcome, TerminalEvent, solve_with_restarts_by,
};
use schoning::sat::trace::{RunSummary, SolutionFile, TraceRecorder, UnsatSeries, record_all};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};
use tracing::{info, warn};

/// Defines the command-line interface for the random-walk solver.
///
/// Uses `clap` for parsing arguments.
#[derive(Parser, Debug)]
#[command(
    name = "schoning",
    version,
    about = "Schöning's random-walk solver for 3-SAT",
    args_conflicts_with_subcommands = true
)]
pub(crate) struct Cli {
    /// An optional path argument. If provided without a subcommand,
    /// it's treated as the path to a problem file to solve.
    pub path: Option<PathBuf>,

    /// Specifies the subcommand to execute (e.g. `file`, `text`, `dir`).
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Common options applicable to all commands.
    #[command(flatten)]
    pub common: CommonOptions,
}

impl Cli {
    /// The options of whichever command will run.
    pub(crate) fn active_options(&self) -> &CommonOptions {
        match &self.command {
            Some(
                Commands::File { common, .. }
                | Commands::Text { common, .. }
                | Commands::Dir { common, .. },
            ) => common,
            Some(Commands::Completions { .. }) | None => &self.common,
        }
    }
}

/// Enumerates the available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a problem file (line 1 placeholder, line 2 `p cnf <vars> <clauses>`, then clauses).
    File {
        /// Path to the problem file.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve a problem provided as text. Literal `\n` sequences are read as line breaks.
    Text {
        /// Problem text, e.g. "c\np cnf 2 2\n1 -2 0\n2 0".
        #[arg(short, long)]
        input: String,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Solve every `.txt` and `.cnf` problem under a directory.
    Dir {
        /// Directory to scan recursively.
        #[arg(long)]
        path: PathBuf,

        /// Common options for this subcommand.
        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// How the variable to flip is chosen.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum StrategyArg {
    /// Any variable, uniformly at random.
    #[default]
    Uniform,
    /// A random literal of a random unsatisfied clause.
    Clause,
}

impl From<StrategyArg> for FlipStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Uniform => Self::UniformVariable,
            StrategyArg::Clause => Self::UnsatisfiedClause,
        }
    }
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct CommonOptions {
    /// Enable debug output, printing the parsed formula and raising the log level.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,

    /// Skip re-evaluating a found assignment against the formula.
    #[arg(long = "no-verify", action = clap::ArgAction::SetFalse)]
    pub(crate) verify: bool,

    /// Skip printing problem and search statistics after solving.
    #[arg(long = "no-stats", action = clap::ArgAction::SetFalse)]
    pub(crate) stats: bool,

    /// Enable printing of the satisfying assignment if one is found.
    #[arg(short, long, default_value_t = false)]
    pub(crate) print_solution: bool,

    /// Seed for the random source. A fresh seed is drawn when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,

    /// Flips allowed per variable in one walk.
    #[arg(long, default_value_t = DEFAULT_FLIPS_PER_VARIABLE)]
    pub(crate) flips_per_variable: usize,

    /// Fixed flip limit per walk; overrides `--flips-per-variable`.
    #[arg(long)]
    pub(crate) max_flips: Option<usize>,

    /// How the variable to flip is chosen.
    #[arg(long, value_enum, default_value_t = StrategyArg::Uniform)]
    pub(crate) strategy: StrategyArg,

    /// Independent walks to try before giving up.
    #[arg(long, default_value_t = 1)]
    pub(crate) restarts: usize,

    /// Write a `solution_<file>` step log for each walk into this directory.
    #[arg(long)]
    pub(crate) trace_dir: Option<PathBuf>,

    /// Also write `graph_solution_<file>.dat` chart data into the trace directory (or `.`).
    #[arg(long, default_value_t = false)]
    pub(crate) series: bool,

    /// Keep every token of clause lines wider than four tokens instead of dropping the first.
    #[arg(long, default_value_t = false)]
    pub(crate) keep_wide_clauses: bool,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: 0,
            verify: true,
            stats: true,
            print_solution: false,
            seed: None,
            flips_per_variable: DEFAULT_FLIPS_PER_VARIABLE,
            max_flips: None,
            strategy: StrategyArg::default(),
            restarts: 1,
            trace_dir: None,
            series: false,
            keep_wide_clauses: false,
        }
    }
}

impl CommonOptions {
    pub(crate) const fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            drop_leading_token_on_wide_lines: !self.keep_wide_clauses,
        }
    }

    pub(crate) fn search_config(&self) -> SearchConfig {
        let budget = self.max_flips.map_or(
            IterationBudget::PerVariable(self.flips_per_variable),
            IterationBudget::Fixed,
        );
        SearchConfig {
            budget,
            strategy: self.strategy.into(),
        }
    }

    fn rng(&self) -> fastrand::Rng {
        self.seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed)
    }
}

/// What a single invocation of the solver produced.
#[derive(Debug)]
pub(crate) struct RunReport {
    pub outcome: SearchOutcome,
    pub tries: usize,
    pub flips: usize,
    pub evaluations: usize,
    pub elapsed: Duration,
}

/// Parses a problem file and solves it.
///
/// # Errors
///
/// If the file cannot be read or parsed, or a trace cannot be written.
pub(crate) fn solve_path(path: &Path, common: &CommonOptions) -> Result<()> {
    let time = Instant::now();
    let formula = parse_file(path, common.parse_options())
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let parse_time = time.elapsed();

    solve_and_report(&formula, common, Some(path), parse_time)
}

/// Parses problem text and solves it.
///
/// # Errors
///
/// If the text cannot be parsed, or a trace cannot be written.
pub(crate) fn solve_text(input: &str, common: &CommonOptions) -> Result<()> {
    let time = Instant::now();
    let text = input.replace("\\n", "\n");
    let formula = parse_dimacs(text.as_bytes(), common.parse_options())
        .context("failed to parse text input")?;
    let parse_time = time.elapsed();

    solve_and_report(&formula, common, None, parse_time)
}

/// Solves a directory of problem files.
/// Every `.txt` and `.cnf` file below `path` is parsed and solved in file-name order.
/// Files that fail to parse are reported and skipped.
///
/// # Errors
///
/// If `path` is not a directory.
pub(crate) fn solve_dir(path: &Path, common: &CommonOptions) -> Result<()> {
    if !path.is_dir() {
        anyhow::bail!("provided path is not a directory: {}", path.display());
    }

    for entry in walkdir::WalkDir::new(path)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        let file_path = entry.path();
        if !file_path.is_file() {
            continue;
        }

        if file_path
            .extension()
            .is_none_or(|ext| ext != "txt" && ext != "cnf")
        {
            info!("skipping {}", file_path.display());
            continue;
        }

        if let Err(e) = solve_path(file_path, common) {
            warn!("{e:#}");
        }
    }

    Ok(())
}

/// Runs up to `common.restarts` walks over `formula`, feeding each walk's
/// events to the recorders `common` asks for.
///
/// # Errors
///
/// If the formula references undeclared variables, or a trace cannot be written.
pub(crate) fn solve(
    formula: &Formula,
    common: &CommonOptions,
    label: Option<&Path>,
) -> Result<RunReport> {
    let tries = common.restarts.max(1);
    let name = label
        .and_then(Path::file_name)
        .map_or_else(|| "text".to_string(), |n| n.to_string_lossy().into_owned());

    let time = Instant::now();
    let result = solve_with_restarts_by(
        formula,
        common.search_config(),
        common.rng(),
        tries,
        |attempt, search| {
            let summary = RunSummary {
                initial_assignment: search.initial_assignment().clone(),
                variables: search.formula().variables,
                num_clauses: search.formula().num_clauses,
            };
            let stem = if tries > 1 {
                format!("{name}.try{attempt}")
            } else {
                name.clone()
            };

            let terminal = record_walk(search, &summary, &stem, common)?;
            Ok::<_, anyhow::Error>(terminal.map_or(
                SearchOutcome::NotFound {
                    iterations: search.budget(),
                },
                SearchOutcome::from,
            ))
        },
    )?;

    Ok(RunReport {
        outcome: result.outcome,
        tries: result.tries,
        flips: result.flips,
        evaluations: result.evaluations,
        elapsed: time.elapsed(),
    })
}

/// Drains one walk into the recorders requested on the command line.
fn record_walk(
    search: &mut Search<'_, &mut fastrand::Rng>,
    summary: &RunSummary,
    stem: &str,
    common: &CommonOptions,
) -> Result<Option<TerminalEvent>> {
    let out_dir = common.trace_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut recorders: Vec<Box<dyn TraceRecorder>> = Vec::new();

    if common.trace_dir.is_some() {
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("unable to create {}", out_dir.display()))?;
        let trace_path = out_dir.join(format!("solution_{stem}"));
        let file = File::create(&trace_path)
            .with_context(|| format!("unable to write {}", trace_path.display()))?;
        recorders.push(Box::new(SolutionFile::new(BufWriter::new(file))));
    }

    let mut series = common
        .series
        .then(|| UnsatSeries::new(format!("graph_solution_{stem}")));

    let terminal = {
        let mut sinks: Vec<&mut dyn TraceRecorder> =
            recorders.iter_mut().map(|r| &mut **r as &mut dyn TraceRecorder).collect();
        if let Some(series) = series.as_mut() {
            sinks.push(series);
        }
        record_all(sinks.as_mut_slice(), summary, search.by_ref())?
    };

    if let Some(series) = series {
        let data_path = out_dir.join(format!("{}.dat", series.title));
        let file = File::create(&data_path)
            .with_context(|| format!("unable to write {}", data_path.display()))?;
        series.write_data(BufWriter::new(file))?;
        info!("chart data written to {}", data_path.display());
    }

    Ok(terminal)
}

/// Verifies a found assignment against the formula.
///
/// # Errors
///
/// If the assignment does not satisfy every clause.
pub(crate) fn verify_solution(formula: &Formula, outcome: &SearchOutcome) -> Result<()> {
    if let Some(assignment) = outcome.assignment() {
        let result = evaluate(assignment, formula);
        println!("Verified: {:?}", result.satisfied);
        anyhow::ensure!(result.satisfied, "solution failed verification");
    }
    Ok(())
}

/// Solves a formula and reports results including stats and verification.
///
/// # Errors
///
/// See [`solve`] and [`verify_solution`].
pub(crate) fn solve_and_report(
    formula: &Formula,
    common: &CommonOptions,
    label: Option<&Path>,
    parse_time: Duration,
) -> Result<()> {
    if let Some(name) = label {
        println!("Solving: {}", name.display());
    }

    if common.debug {
        println!("Formula:\n{formula}");
        println!("Variables: {}", formula.variables);
        println!("Clauses (declared): {}", formula.num_clauses);
        println!("Clauses (parsed): {}", formula.len());
    }

    let report = solve(formula, common, label)?;

    if common.verify {
        verify_solution(formula, &report.outcome)?;
    }

    if common.stats {
        print_stats(parse_time, formula, &report, memory_usage());
    }

    print_outcome(&report.outcome, common.print_solution);
    Ok(())
}

/// Allocated and resident memory in MiB, if jemalloc can report them.
fn memory_usage() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::read().ok()?;
    let resident = stats::resident::read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Prints a summary of problem and search statistics.
pub(crate) fn print_stats(
    parse_time: Duration,
    formula: &Formula,
    report: &RunReport,
    memory: Option<(f64, f64)>,
) {
    let elapsed_secs = report.elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Parse time (s)", format!("{:.3}", parse_time.as_secs_f64()));
    stat_line("Variables", formula.variables);
    stat_line("Clauses (declared)", formula.num_clauses);
    stat_line("Clauses (parsed)", formula.len());

    println!("========================[ Search Statistics ]========================");
    stat_line("Walks", report.tries);
    stat_line_with_rate("Flips", report.flips, elapsed_secs);
    stat_line_with_rate("Evaluations", report.evaluations, elapsed_secs);
    if let Some((allocated, resident)) = memory {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}

fn print_outcome(outcome: &SearchOutcome, print_solution: bool) {
    match outcome {
        SearchOutcome::Found(assignment) => {
            if print_solution {
                println!("Solution: {assignment}");
            }
            println!("\nSATISFIABLE");
        }
        SearchOutcome::NotFound { iterations } => {
            println!("\nUNKNOWN (no solution found in {iterations} iterations)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_search_config_defaults_to_three_flips_per_variable() {
        let config = CommonOptions::default().search_config();
        assert_eq!(config.budget, IterationBudget::PerVariable(3));
        assert_eq!(config.strategy, FlipStrategy::UniformVariable);
    }

    #[test]
    fn test_max_flips_overrides_per_variable() {
        let common = CommonOptions {
            max_flips: Some(50),
            strategy: StrategyArg::Clause,
            ..CommonOptions::default()
        };
        let config = common.search_config();
        assert_eq!(config.budget, IterationBudget::Fixed(50));
        assert_eq!(config.strategy, FlipStrategy::UnsatisfiedClause);
    }

    #[test]
    fn test_keep_wide_clauses_flag() {
        let common = CommonOptions {
            keep_wide_clauses: true,
            ..CommonOptions::default()
        };
        assert!(!common.parse_options().drop_leading_token_on_wide_lines);
        assert!(CommonOptions::default().parse_options().drop_leading_token_on_wide_lines);
    }

    #[test]
    fn test_parse_subcommand_options() {
        let cli = Cli::parse_from([
            "schoning", "file", "--path", "uf20.txt", "--seed", "7", "--restarts", "3", "-vv",
            "--no-stats",
        ]);
        let common = cli.active_options();
        assert_eq!(common.seed, Some(7));
        assert_eq!(common.restarts, 3);
        assert_eq!(common.verbose, 2);
        assert!(!common.stats);
        assert!(common.verify);
    }

    #[test]
    fn test_bare_path_without_subcommand() {
        let cli = Cli::parse_from(["schoning", "problems/uf20-01.txt", "--seed", "3"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.path, Some(PathBuf::from("problems/uf20-01.txt")));
        assert_eq!(cli.active_options().seed, Some(3));
    }

    #[test]
    fn test_seeded_solve_is_reproducible() {
        let formula = schoning::sat::dimacs::parse_str(
            "c\np cnf 4 4\n1 2 -3 0\n-1 3 4 0\n-2 -4 1 0\n2 3 4 0\n",
        )
        .unwrap();
        let common = CommonOptions {
            seed: Some(5),
            ..CommonOptions::default()
        };
        let a = solve(&formula, &common, None).unwrap();
        let b = solve(&formula, &common, None).unwrap();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.flips, b.flips);
    }

    #[test]
    fn test_contradiction_reports_not_found_after_restarts() {
        let formula = schoning::sat::dimacs::parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        let common = CommonOptions {
            seed: Some(1),
            restarts: 3,
            ..CommonOptions::default()
        };
        let report = solve(&formula, &common, None).unwrap();
        assert_eq!(report.tries, 3);
        assert_eq!(report.flips, 9);
        assert_eq!(report.evaluations, 9);
        assert_eq!(report.outcome, SearchOutcome::NotFound { iterations: 3 });
    }
}
