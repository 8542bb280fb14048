#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Literals: a 0-based variable index paired with an explicit polarity.
//!
//! Input files encode a literal as a single signed integer `t` (DIMACS style),
//! where the sign carries the polarity and the magnitude is the 1-based
//! variable number. Decoding shifts the magnitude down by one, so `1` and `-1`
//! both refer to variable `0`, `3` and `-3` to variable `2`, and so on.

use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// A 0-based variable index.
pub type Variable = usize;

/// Whether a literal refers to its variable directly or to its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Polarity {
    /// The literal is true when the variable is true.
    #[default]
    Positive,
    /// The literal is true when the variable is false.
    Negative,
}

impl Polarity {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal {
    pub variable: Variable,
    pub polarity: Polarity,
}

impl Literal {
    #[must_use]
    pub const fn new(variable: Variable, polarity: Polarity) -> Self {
        Self { variable, polarity }
    }

    #[must_use]
    pub const fn positive(variable: Variable) -> Self {
        Self::new(variable, Polarity::Positive)
    }

    #[must_use]
    pub const fn negative(variable: Variable) -> Self {
        Self::new(variable, Polarity::Negative)
    }

    /// Decodes a signed DIMACS token into a literal.
    ///
    /// Returns `None` for `0`, which is the clause terminator and not a literal.
    #[must_use]
    pub fn from_dimacs(token: i32) -> Option<Self> {
        if token == 0 {
            return None;
        }
        let polarity = if token > 0 {
            Polarity::Positive
        } else {
            Polarity::Negative
        };
        // magnitude >= 1 here, so the shift cannot underflow
        let variable = token.unsigned_abs() as usize - 1;
        Some(Self::new(variable, polarity))
    }

    /// Encodes the literal back into its signed DIMACS token.
    ///
    /// # Panics
    ///
    /// If the variable index does not fit in an `i32` token.
    #[must_use]
    pub fn to_dimacs(self) -> i32 {
        let magnitude =
            i32::try_from(self.variable + 1).expect("literal variable overflowed a DIMACS token");
        match self.polarity {
            Polarity::Positive => magnitude,
            Polarity::Negative => -magnitude,
        }
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self.polarity, Polarity::Negative)
    }

    #[must_use]
    pub const fn negated(self) -> Self {
        Self::new(self.variable, self.polarity.flipped())
    }

    /// The truth value of this literal when its variable is set to `value`.
    #[must_use]
    pub const fn value_under(self, value: bool) -> bool {
        value ^ self.is_negated()
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dimacs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dimacs_shifts_to_zero_based() {
        assert_eq!(Literal::from_dimacs(1), Some(Literal::positive(0)));
        assert_eq!(Literal::from_dimacs(3), Some(Literal::positive(2)));
        assert_eq!(Literal::from_dimacs(-1), Some(Literal::negative(0)));
        assert_eq!(Literal::from_dimacs(-2), Some(Literal::negative(1)));
    }

    #[test]
    fn test_from_dimacs_zero_is_terminator() {
        assert_eq!(Literal::from_dimacs(0), None);
    }

    #[test]
    fn test_to_dimacs_inverts_decoding() {
        assert_eq!(Literal::negative(4).to_dimacs(), -5);
        assert_eq!(Literal::positive(0).to_dimacs(), 1);
    }

    #[test]
    fn test_literal_neg() {
        assert_eq!(-Literal::positive(1), Literal::negative(1));
        assert_eq!(!Literal::negative(1), Literal::positive(1));
    }

    #[test]
    fn test_value_under() {
        assert!(Literal::positive(0).value_under(true));
        assert!(!Literal::positive(0).value_under(false));
        assert!(Literal::negative(0).value_under(false));
        assert!(!Literal::negative(0).value_under(true));
    }
}
