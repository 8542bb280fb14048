#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The clause set a search runs against.
//!
//! A `Formula` keeps two counts next to its clauses: `variables`, the width of
//! every assignment, and `num_clauses`, the clause count the input header
//! declared. The declared count is reported as-is and may differ from
//! `clauses.len()`.

use crate::sat::clause::Clause;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A literal referring to a variable the formula does not declare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    #[error(
        "clause {clause} references variable {} but the formula declares {variables} variables",
        .variable + 1
    )]
    VariableOutOfRange {
        clause: usize,
        variable: usize,
        variables: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Formula {
    pub clauses: Vec<Clause>,
    pub variables: usize,
    pub num_clauses: usize,
}

impl Formula {
    #[must_use]
    pub const fn new(clauses: Vec<Clause>, variables: usize, num_clauses: usize) -> Self {
        Self {
            clauses,
            variables,
            num_clauses,
        }
    }

    /// Builds a formula from DIMACS-style clause tokens, deriving `variables`
    /// from the largest variable mentioned and `num_clauses` from the clause count.
    pub fn from_dimacs<I, J>(clauses: I) -> Self
    where
        I: IntoIterator<Item = J>,
        J: IntoIterator<Item = i32>,
    {
        let clauses = clauses.into_iter().map(Clause::from_dimacs).collect_vec();
        let variables = clauses
            .iter()
            .filter_map(Clause::max_variable)
            .max()
            .map_or(0, |v| v + 1);
        let num_clauses = clauses.len();
        Self::new(clauses, variables, num_clauses)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Checks every literal lies in `[0, variables)`.
    ///
    /// # Errors
    ///
    /// `FormulaError::VariableOutOfRange` for the first offending clause.
    pub fn validate(&self) -> Result<(), FormulaError> {
        for (idx, clause) in self.clauses.iter().enumerate() {
            if let Some(variable) = clause.max_variable() {
                if variable >= self.variables {
                    return Err(FormulaError::VariableOutOfRange {
                        clause: idx,
                        variable,
                        variables: self.variables,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Writes the formula in the input layout: a placeholder line, the header,
/// then one clause per line.
impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "c")?;
        writeln!(f, "p cnf {} {}", self.variables, self.num_clauses)?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
