#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Truth assignments.
//!
//! An `Assignment` gives every variable of a formula a value, packed one bit
//! per variable. The walk flips single bits in place and copies the whole
//! vector into each event it emits.

use crate::sat::literal::{Literal, Variable};
use crate::sat::random::RandomSource;
use bit_vec::BitVec;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A complete truth assignment: one bit per variable.
///
/// Displayed the way the solution trace prints it, e.g. `[1 0 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(BitVec);

impl Assignment {
    /// All `num_vars` variables false.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(BitVec::from_elem(num_vars, false))
    }

    /// Draws `num_vars` independent uniform bits.
    pub fn random<R: RandomSource + ?Sized>(num_vars: usize, rng: &mut R) -> Self {
        Self((0..num_vars).map(|_| rng.bit()).collect())
    }

    /// Variable `i` takes the `i`-th value.
    pub fn from_bools(values: impl IntoIterator<Item = bool>) -> Self {
        Self(values.into_iter().collect())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// # Panics
    ///
    /// If `var` is outside the assignment.
    #[must_use]
    pub fn value(&self, var: Variable) -> bool {
        self.0.get(var).unwrap_or_else(|| {
            panic!(
                "variable index {var} out of range for an assignment of {} variables",
                self.len()
            )
        })
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> bool {
        lit.value_under(self.value(lit.variable))
    }

    /// Negates one variable in place.
    ///
    /// # Panics
    ///
    /// If `var` is outside the assignment.
    pub fn flip(&mut self, var: Variable) {
        let current = self.value(var);
        self.0.set(var, !current);
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter()
    }

    /// The model as DIMACS literals: `i` for true variables, `-i` for false ones.
    #[must_use]
    pub fn to_dimacs(&self) -> Vec<i32> {
        self.iter()
            .enumerate()
            .map(|(var, value)| {
                let lit = if value {
                    Literal::positive(var)
                } else {
                    Literal::negative(var)
                };
                lit.to_dimacs()
            })
            .collect()
    }
}

impl Display for Assignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.iter().map(u8::from).join(" "))
    }
}
