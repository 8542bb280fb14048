#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod clause;
pub mod cnf;
pub mod dimacs;
pub mod evaluator;
pub mod literal;
pub mod random;
pub mod schoning;
pub mod trace;
