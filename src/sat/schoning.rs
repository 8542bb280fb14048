#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Schöning's random walk for 3-SAT.
//!
//! A run starts from a uniformly random assignment and, for at most
//! `budget` steps, evaluates the current assignment and flips one variable if
//! it does not yet satisfy the formula. The default budget is `3 × variables`.
//! Once the budget is spent the walk ends with `NotFound` without evaluating
//! the assignment left by the final flip. A formula without variables has a
//! budget of zero and gets exactly one evaluation.
//!
//! A run is exposed as a lazy [`Search`] iterator of [`Event`]s: one
//! [`IterationEvent`] per flip, then exactly one [`TerminalEvent`]. The engine
//! does no I/O of its own; trace files and charts are built from the events by
//! the caller (see [`crate::sat::trace`]).
//!
//! Two flip strategies are provided:
//! - [`FlipStrategy::UniformVariable`] flips a variable drawn uniformly from
//!   all variables, independent of clause structure. This is the default.
//! - [`FlipStrategy::UnsatisfiedClause`] is the textbook step: pick an
//!   unsatisfied clause at random, then one of its literals at random, and
//!   flip that literal's variable.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::{Formula, FormulaError};
use crate::sat::evaluator::{EvaluationResult, evaluate, unsatisfied_clauses};
use crate::sat::literal::Variable;
use crate::sat::random::RandomSource;
use std::fmt::{Display, Formatter};
use std::iter::FusedIterator;
use tracing::{debug, info, trace};

/// Steps per variable in the default budget.
pub const DEFAULT_FLIPS_PER_VARIABLE: usize = 3;

/// How many flips a single walk may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationBudget {
    /// `k × variables` steps.
    PerVariable(usize),
    /// A fixed number of steps regardless of formula size.
    Fixed(usize),
}

impl Default for IterationBudget {
    fn default() -> Self {
        Self::PerVariable(DEFAULT_FLIPS_PER_VARIABLE)
    }
}

impl IterationBudget {
    /// The step limit for a formula over `variables` variables.
    ///
    /// A formula without variables has nothing to flip, so its limit is zero.
    #[must_use]
    pub const fn limit(self, variables: usize) -> usize {
        if variables == 0 {
            return 0;
        }
        match self {
            Self::PerVariable(k) => k.saturating_mul(variables),
            Self::Fixed(n) => n,
        }
    }
}

/// How the variable to flip is chosen at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlipStrategy {
    /// Any variable, uniformly.
    #[default]
    UniformVariable,
    /// A variable of a random literal in a random unsatisfied clause.
    UnsatisfiedClause,
}

impl Display for FlipStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UniformVariable => write!(f, "uniform"),
            Self::UnsatisfiedClause => write!(f, "clause"),
        }
    }
}

/// Tunables for a single walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SearchConfig {
    pub budget: IterationBudget,
    pub strategy: FlipStrategy,
}

/// One non-satisfying step of a walk.
///
/// The clause counts describe the assignment *before* the flip;
/// `assignment` is the assignment *after* it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationEvent {
    pub index: usize,
    pub satisfied_clauses: usize,
    pub unsatisfied_clauses: usize,
    /// 1-based number of the flipped variable.
    pub flipped_variable: Option<usize>,
    pub assignment: Assignment,
}

/// The last event of a walk. Exactly one is emitted per walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// The assignment evaluated at step `iteration` satisfies every clause.
    Found {
        iteration: usize,
        evaluation: EvaluationResult,
        assignment: Assignment,
    },
    /// The budget ran out; `iterations` is the budget.
    NotFound { iterations: usize },
}

/// An item of the [`Search`] stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A flip was made.
    Iteration(IterationEvent),
    /// The walk is over.
    Terminal(TerminalEvent),
}

impl Event {
    /// Unsatisfied-clause count of the assignment this event evaluated, if any.
    #[must_use]
    pub const fn unsatisfied_clauses(&self) -> Option<usize> {
        match self {
            Self::Iteration(it) => Some(it.unsatisfied_clauses),
            Self::Terminal(TerminalEvent::Found { evaluation, .. }) => {
                Some(evaluation.unsatisfied_clauses)
            }
            Self::Terminal(TerminalEvent::NotFound { .. }) => None,
        }
    }
}

/// What a walk settled on, without its step history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(Assignment),
    NotFound { iterations: usize },
}

impl SearchOutcome {
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Found(a) => Some(a),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<TerminalEvent> for SearchOutcome {
    fn from(event: TerminalEvent) -> Self {
        match event {
            TerminalEvent::Found { assignment, .. } => Self::Found(assignment),
            TerminalEvent::NotFound { iterations } => Self::NotFound { iterations },
        }
    }
}

/// A single random walk, driven by iterating it.
///
/// The walk owns its assignment exclusively; events carry copies. Once the
/// terminal event has been yielded the iterator is exhausted.
#[derive(Debug)]
pub struct Search<'a, R: RandomSource> {
    formula: &'a Formula,
    config: SearchConfig,
    rng: R,
    initial: Assignment,
    current: Assignment,
    budget: usize,
    iteration: usize,
    evaluations: usize,
    finished: bool,
}

impl<'a, R: RandomSource> Search<'a, R> {
    /// Draws the initial assignment and prepares a walk over `formula`.
    ///
    /// # Errors
    ///
    /// `FormulaError::VariableOutOfRange` if a literal lies outside
    /// `[0, formula.variables)`. No randomness is consumed in that case.
    pub fn new(
        formula: &'a Formula,
        config: SearchConfig,
        mut rng: R,
    ) -> Result<Self, FormulaError> {
        formula.validate()?;

        let initial = Assignment::random(formula.variables, &mut rng);
        let budget = config.budget.limit(formula.variables);

        debug!(
            variables = formula.variables,
            clauses = formula.len(),
            budget,
            strategy = %config.strategy,
            "starting random walk"
        );

        Ok(Self {
            formula,
            config,
            rng,
            current: initial.clone(),
            initial,
            budget,
            iteration: 0,
            evaluations: 0,
            finished: false,
        })
    }

    #[must_use]
    pub const fn initial_assignment(&self) -> &Assignment {
        &self.initial
    }

    #[must_use]
    pub const fn formula(&self) -> &Formula {
        self.formula
    }

    #[must_use]
    pub const fn budget(&self) -> usize {
        self.budget
    }

    /// Number of evaluations performed so far. Never exceeds `max(budget, 1)`.
    #[must_use]
    pub const fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of flips performed so far.
    #[must_use]
    pub const fn flips(&self) -> usize {
        self.iteration
    }

    /// Drains the walk and returns its outcome.
    pub fn run(&mut self) -> SearchOutcome {
        self.by_ref()
            .find_map(|event| match event {
                Event::Terminal(terminal) => Some(SearchOutcome::from(terminal)),
                Event::Iteration(_) => None,
            })
            .unwrap_or(SearchOutcome::NotFound {
                iterations: self.budget,
            })
    }

    fn pick_variable(&mut self) -> Variable {
        let formula = self.formula;
        match self.config.strategy {
            FlipStrategy::UniformVariable => self.rng.index(formula.variables),
            FlipStrategy::UnsatisfiedClause => {
                let unsatisfied = unsatisfied_clauses(&self.current, formula);
                let clause = &formula.clauses[unsatisfied[self.rng.index(unsatisfied.len())]];
                if clause.is_empty() {
                    // an empty clause has no literal to flip
                    self.rng.index(formula.variables)
                } else {
                    clause[self.rng.index(clause.len())].variable
                }
            }
        }
    }

    fn finish(&mut self, event: TerminalEvent) -> Event {
        self.finished = true;
        match &event {
            TerminalEvent::Found { iteration, .. } => {
                debug!(iteration, "satisfying assignment found");
            }
            TerminalEvent::NotFound { iterations } => {
                debug!(iterations, "no satisfying assignment within budget");
            }
        }
        Event::Terminal(event)
    }
}

impl<R: RandomSource> Iterator for Search<'_, R> {
    type Item = Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        // the assignment produced by the last allowed flip is not evaluated
        if self.budget > 0 && self.iteration >= self.budget {
            return Some(self.finish(TerminalEvent::NotFound {
                iterations: self.budget,
            }));
        }

        let evaluation = evaluate(&self.current, self.formula);
        self.evaluations += 1;

        if evaluation.satisfied {
            return Some(self.finish(TerminalEvent::Found {
                iteration: self.iteration,
                evaluation,
                assignment: self.current.clone(),
            }));
        }

        if self.budget == 0 {
            return Some(self.finish(TerminalEvent::NotFound { iterations: 0 }));
        }

        let var = self.pick_variable();
        self.current.flip(var);

        trace!(
            iteration = self.iteration,
            unsatisfied = evaluation.unsatisfied_clauses,
            flipped = var + 1,
            "flip"
        );

        let event = IterationEvent {
            index: self.iteration,
            satisfied_clauses: evaluation.satisfied_clauses,
            unsatisfied_clauses: evaluation.unsatisfied_clauses,
            flipped_variable: Some(var + 1),
            assignment: self.current.clone(),
        };
        self.iteration += 1;

        Some(Event::Iteration(event))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (1, Some(self.budget - self.iteration + 1))
        }
    }
}

impl<R: RandomSource> FusedIterator for Search<'_, R> {}

/// Runs one walk with the default configuration.
///
/// # Errors
///
/// `FormulaError` if the formula references undeclared variables.
pub fn solve<R: RandomSource>(formula: &Formula, rng: R) -> Result<SearchOutcome, FormulaError> {
    Ok(Search::new(formula, SearchConfig::default(), rng)?.run())
}

/// The result of a sequence of walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartOutcome {
    pub outcome: SearchOutcome,
    /// Walks started, including the successful one.
    pub tries: usize,
    /// Flips summed over every walk.
    pub flips: usize,
    /// Evaluations summed over every walk.
    pub evaluations: usize,
}

/// Repeats independent walks, each from a fresh random assignment, until one
/// succeeds or `tries` walks have failed. At least one walk is always run.
///
/// # Errors
///
/// `FormulaError` if the formula references undeclared variables.
pub fn solve_with_restarts<R: RandomSource>(
    formula: &Formula,
    config: SearchConfig,
    rng: R,
    tries: usize,
) -> Result<RestartOutcome, FormulaError> {
    solve_with_restarts_by(formula, config, rng, tries, |_, search| {
        Ok::<_, FormulaError>(search.run())
    })
}

/// Like [`solve_with_restarts`], but every walk is handed to `drive` along
/// with its 1-based attempt number. `drive` consumes the walk's events and
/// returns its outcome; a failure from `drive` aborts the remaining walks.
///
/// # Errors
///
/// `FormulaError` (converted into `E`) if the formula references undeclared
/// variables, or whatever `drive` returns.
pub fn solve_with_restarts_by<R, E, F>(
    formula: &Formula,
    config: SearchConfig,
    mut rng: R,
    tries: usize,
    mut drive: F,
) -> Result<RestartOutcome, E>
where
    R: RandomSource,
    E: From<FormulaError>,
    F: FnMut(usize, &mut Search<'_, &mut R>) -> Result<SearchOutcome, E>,
{
    let tries = tries.max(1);
    let mut result = RestartOutcome {
        outcome: SearchOutcome::NotFound { iterations: 0 },
        tries: 0,
        flips: 0,
        evaluations: 0,
    };

    for attempt in 1..=tries {
        let mut search = Search::new(formula, config, &mut rng)?;
        result.outcome = drive(attempt, &mut search)?;
        result.tries = attempt;
        result.flips += search.flips();
        result.evaluations += search.evaluations();

        if result.outcome.is_found() {
            break;
        }
        if attempt < tries {
            info!(attempt, "walk exhausted its budget, restarting");
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::clause::Clause;
    use crate::sat::dimacs::parse_str;
    use std::collections::VecDeque;

    /// Replays fixed draws so a walk can be followed step by step.
    #[derive(Debug, Default)]
    struct Scripted {
        bits: VecDeque<bool>,
        indices: VecDeque<usize>,
    }

    impl Scripted {
        fn new(bits: &[bool], indices: &[usize]) -> Self {
            Self {
                bits: bits.iter().copied().collect(),
                indices: indices.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for Scripted {
        fn bit(&mut self) -> bool {
            self.bits.pop_front().expect("script ran out of bits")
        }

        fn index(&mut self, bound: usize) -> usize {
            let idx = self.indices.pop_front().expect("script ran out of indices");
            assert!(idx < bound, "scripted index {idx} not below {bound}");
            idx
        }
    }

    fn terminal(events: &[Event]) -> &TerminalEvent {
        match events.last() {
            Some(Event::Terminal(t)) => t,
            other => panic!("last event is not terminal: {other:?}"),
        }
    }

    #[test]
    fn test_found_immediately() {
        let formula = parse_str("c\np cnf 1 1\n1 0\n").unwrap();
        let rng = Scripted::new(&[true], &[]);
        let events: Vec<Event> = Search::new(&formula, SearchConfig::default(), rng)
            .unwrap()
            .collect();

        assert_eq!(events.len(), 1);
        assert_eq!(
            terminal(&events),
            &TerminalEvent::Found {
                iteration: 0,
                evaluation: EvaluationResult {
                    satisfied: true,
                    satisfied_clauses: 1,
                    unsatisfied_clauses: 0,
                },
                assignment: Assignment::from_bools([true]),
            }
        );
    }

    #[test]
    fn test_found_after_one_flip() {
        let formula = parse_str("c\np cnf 1 1\n1 0\n").unwrap();
        let rng = Scripted::new(&[false], &[0]);
        let events: Vec<Event> = Search::new(&formula, SearchConfig::default(), rng)
            .unwrap()
            .collect();

        assert_eq!(
            events[0],
            Event::Iteration(IterationEvent {
                index: 0,
                satisfied_clauses: 0,
                unsatisfied_clauses: 1,
                flipped_variable: Some(1),
                assignment: Assignment::from_bools([true]),
            })
        );
        assert!(matches!(
            terminal(&events),
            TerminalEvent::Found { iteration: 1, .. }
        ));
    }

    #[test]
    fn test_contradiction_exhausts_budget() {
        let formula = parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        for seed in 0..20 {
            let rng = fastrand::Rng::with_seed(seed);
            let mut search = Search::new(&formula, SearchConfig::default(), rng).unwrap();
            let events: Vec<Event> = search.by_ref().collect();

            assert_eq!(events.len(), 4);
            assert_eq!(terminal(&events), &TerminalEvent::NotFound { iterations: 3 });
            assert_eq!(search.evaluations(), 3);
            assert_eq!(search.flips(), 3);
            for (i, event) in events[..3].iter().enumerate() {
                match event {
                    Event::Iteration(it) => {
                        assert_eq!(it.index, i);
                        assert_eq!(it.unsatisfied_clauses, 1);
                    }
                    Event::Terminal(_) => panic!("terminal event before the budget ran out"),
                }
            }
        }
    }

    #[test]
    fn test_final_flip_is_not_evaluated() {
        // (x1) ^ (x2) from 0 0: five flips of x1, then the sixth and last
        // flip sets x2 and would satisfy both clauses
        let formula = parse_str("c\np cnf 2 2\n1 0\n2 0\n").unwrap();
        let rng = Scripted::new(&[false, false], &[0, 0, 0, 0, 0, 1]);
        let mut search = Search::new(&formula, SearchConfig::default(), rng).unwrap();
        let events: Vec<Event> = search.by_ref().collect();

        assert_eq!(events.len(), 7);
        match &events[5] {
            Event::Iteration(it) => {
                assert_eq!(it.index, 5);
                assert_eq!(it.flipped_variable, Some(2));
                assert_eq!(it.assignment, Assignment::from_bools([true, true]));
            }
            Event::Terminal(_) => panic!("expected the sixth flip"),
        }
        assert_eq!(terminal(&events), &TerminalEvent::NotFound { iterations: 6 });
        assert_eq!(search.evaluations(), 6);
    }

    #[test]
    fn test_found_before_last_flip() {
        // same formula, but the fourth flip reaches 1 1 and is checked before the fifth
        let formula = parse_str("c\np cnf 2 2\n1 0\n2 0\n").unwrap();
        let rng = Scripted::new(&[false, false], &[0, 0, 0, 1]);
        let events: Vec<Event> = Search::new(&formula, SearchConfig::default(), rng)
            .unwrap()
            .collect();

        assert!(matches!(
            terminal(&events),
            TerminalEvent::Found { iteration: 4, .. }
        ));
    }

    #[test]
    fn test_zero_variables_empty_formula_found() {
        let formula = parse_str("c\np cnf 0 0\n").unwrap();
        let outcome = solve(&formula, Scripted::default()).unwrap();
        assert_eq!(outcome, SearchOutcome::Found(Assignment::new(0)));
    }

    #[test]
    fn test_zero_variables_with_empty_clause_not_found() {
        let formula = Formula::new(vec![Clause::default()], 0, 1);
        let outcome = solve(&formula, Scripted::default()).unwrap();
        assert_eq!(outcome, SearchOutcome::NotFound { iterations: 0 });
    }

    #[test]
    fn test_out_of_range_formula_is_rejected() {
        let formula = parse_str("c\np cnf 2 1\n1 -3 0\n").unwrap();
        let err = Search::new(&formula, SearchConfig::default(), Scripted::default()).unwrap_err();
        assert!(matches!(
            err,
            FormulaError::VariableOutOfRange { variable: 2, .. }
        ));
    }

    #[test]
    fn test_fixed_budget() {
        let formula = parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        let config = SearchConfig {
            budget: IterationBudget::Fixed(10),
            ..SearchConfig::default()
        };
        let outcome = Search::new(&formula, config, fastrand::Rng::with_seed(1))
            .unwrap()
            .run();
        assert_eq!(outcome, SearchOutcome::NotFound { iterations: 10 });
    }

    #[test]
    fn test_unsatisfied_clause_strategy_flips_a_clause_variable() {
        // (x1 v x2) ^ (x3), start from 1 1 0: only the second clause fails
        let formula = parse_str("c\np cnf 3 2\n1 2 0\n3 0\n").unwrap();
        let config = SearchConfig {
            strategy: FlipStrategy::UnsatisfiedClause,
            ..SearchConfig::default()
        };
        let events: Vec<Event> = Search::new(
            &formula,
            config,
            Scripted::new(&[true, true, false], &[0, 0]),
        )
        .unwrap()
        .collect();

        match &events[0] {
            Event::Iteration(it) => assert_eq!(it.flipped_variable, Some(3)),
            Event::Terminal(_) => panic!("expected a flip first"),
        }
        assert!(matches!(
            terminal(&events),
            TerminalEvent::Found { iteration: 1, .. }
        ));
    }

    #[test]
    fn test_same_seed_same_events() {
        let formula = parse_str("c\np cnf 4 3\n1 -2 3 0\n-1 2 4 0\n-3 -4 2 0\n").unwrap();
        let run = |seed| -> Vec<Event> {
            let rng = fastrand::Rng::with_seed(seed);
            Search::new(&formula, SearchConfig::default(), rng)
                .unwrap()
                .collect()
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn test_iterator_is_fused() {
        let formula = parse_str("c\np cnf 1 1\n1 0\n").unwrap();
        let rng = Scripted::new(&[true], &[]);
        let mut search = Search::new(&formula, SearchConfig::default(), rng).unwrap();
        assert!(search.next().is_some());
        assert!(search.next().is_none());
        assert!(search.next().is_none());
    }

    #[test]
    fn test_restarts_stop_on_contradiction() {
        let formula = parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        let result =
            solve_with_restarts(&formula, SearchConfig::default(), fastrand::Rng::with_seed(3), 4)
                .unwrap();
        assert_eq!(result.tries, 4);
        assert_eq!(result.flips, 12);
        assert_eq!(result.evaluations, 12);
        assert_eq!(result.outcome, SearchOutcome::NotFound { iterations: 3 });
    }

    #[test]
    fn test_restart_driver_sees_every_walk() {
        let formula = parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        let mut attempts = Vec::new();
        let result = solve_with_restarts_by(
            &formula,
            SearchConfig::default(),
            fastrand::Rng::with_seed(8),
            3,
            |attempt, search| {
                attempts.push(attempt);
                Ok::<_, FormulaError>(search.run())
            },
        )
        .unwrap();

        assert_eq!(attempts, vec![1, 2, 3]);
        assert_eq!(result.tries, 3);
    }

    #[test]
    fn test_restart_driver_error_stops_the_loop() {
        let formula = parse_str("c\np cnf 1 2\n1 0\n-1 0\n").unwrap();
        let mut calls = 0;
        let err = solve_with_restarts_by(
            &formula,
            SearchConfig::default(),
            fastrand::Rng::with_seed(8),
            3,
            |_, _| {
                calls += 1;
                Err(FormulaError::VariableOutOfRange {
                    clause: 0,
                    variable: 0,
                    variables: 0,
                })
            },
        )
        .unwrap_err();

        assert_eq!(calls, 1);
        assert!(matches!(err, FormulaError::VariableOutOfRange { .. }));
    }

    #[test]
    fn test_restarts_return_first_success() {
        let formula = parse_str("c\np cnf 1 1\n1 0\n").unwrap();
        let result = solve_with_restarts(
            &formula,
            SearchConfig::default(),
            Scripted::new(&[true], &[]),
            5,
        )
        .unwrap();
        assert_eq!(result.tries, 1);
        assert_eq!(result.flips, 0);
        assert_eq!(result.evaluations, 1);
        assert!(result.outcome.is_found());
    }

    #[test]
    fn test_budget_limit() {
        assert_eq!(IterationBudget::default().limit(20), 60);
        assert_eq!(IterationBudget::PerVariable(5).limit(2), 10);
        assert_eq!(IterationBudget::Fixed(7).limit(100), 7);
        assert_eq!(IterationBudget::Fixed(7).limit(0), 0);
    }
}
