#![deny(missing_docs)]
//! This crate decides satisfiability of 3-CNF formulas with Schöning's randomized
//! local search, and exposes every step of the search as a stream of events.


/// The `sat` module implements the formula parser, the assignment evaluator, the
/// random-walk search engine and the recorders that consume its trace.
#[allow(missing_docs)]
pub mod sat;
