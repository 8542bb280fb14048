#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Scores an assignment against a formula.
//!
//! Every clause is visited, even after the formula is known to be false, so
//! the satisfied and unsatisfied counts always add up to the clause count.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;

/// Clause counts for one assignment.
///
/// `satisfied_clauses + unsatisfied_clauses` is always the number of clauses,
/// and `satisfied` holds exactly when `unsatisfied_clauses` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EvaluationResult {
    pub satisfied: bool,
    pub satisfied_clauses: usize,
    pub unsatisfied_clauses: usize,
}

/// A clause holds when at least one of its literals is true.
///
/// # Panics
///
/// If a literal references a variable outside the assignment.
#[must_use]
pub fn clause_satisfied(clause: &Clause, assignment: &Assignment) -> bool {
    clause.iter().any(|&lit| assignment.literal_value(lit))
}

/// Evaluates every clause of `formula` under `assignment`.
///
/// # Panics
///
/// If a literal references a variable outside `[0, assignment.len())`. Formulas
/// handed to a search are validated first, so this only fires on a caller bug.
#[must_use]
pub fn evaluate(assignment: &Assignment, formula: &Formula) -> EvaluationResult {
    let satisfied_clauses = formula
        .iter()
        .filter(|clause| clause_satisfied(clause, assignment))
        .count();
    let unsatisfied_clauses = formula.len() - satisfied_clauses;

    EvaluationResult {
        satisfied: unsatisfied_clauses == 0,
        satisfied_clauses,
        unsatisfied_clauses,
    }
}

/// Indices of the clauses `assignment` leaves false, in formula order.
#[must_use]
pub fn unsatisfied_clauses(assignment: &Assignment, formula: &Formula) -> Vec<usize> {
    formula
        .iter()
        .enumerate()
        .filter(|(_, clause)| !clause_satisfied(clause, assignment))
        .map(|(idx, _)| idx)
        .collect()
}
