#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Clauses: disjunctions of up to three literals.
//!
//! Literals are stored inline, so a 3-CNF clause costs no heap allocation.

use crate::sat::literal::Literal;
use core::ops::Index;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// Inline capacity of a clause. 3-CNF clauses never spill to the heap.
pub const CLAUSE_WIDTH: usize = 3;

/// A disjunction of literals.
///
/// Clauses built by the parser are never empty; an empty clause is rejected
/// at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    pub literals: SmallVec<[Literal; CLAUSE_WIDTH]>,
}

impl Clause {
    /// Collects literals into a clause, keeping their order.
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().collect(),
        }
    }

    /// Builds a clause from DIMACS tokens, skipping any `0` terminator.
    pub fn from_dimacs(tokens: impl IntoIterator<Item = i32>) -> Self {
        Self::new(tokens.into_iter().filter_map(Literal::from_dimacs))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    /// The highest variable index this clause mentions.
    #[must_use]
    pub fn max_variable(&self) -> Option<usize> {
        self.iter().map(|l| l.variable).max()
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl From<Vec<i32>> for Clause {
    fn from(tokens: Vec<i32>) -> Self {
        Self::from_dimacs(tokens)
    }
}

impl From<&[i32]> for Clause {
    fn from(tokens: &[i32]) -> Self {
        Self::from_dimacs(tokens.iter().copied())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0", self.iter().join(" "))
    }
}
