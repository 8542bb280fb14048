#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! A parser for 3-CNF problem files in a DIMACS-like layout.
//!
//! The layout is positional:
//! - Line 1 is a placeholder (usually a `c` comment) and is ignored.
//! - Line 2 is the header, `p cnf <variables> <clauses>`. The two counts are
//!   read from the tokens following `cnf`. Headers without a `cnf` token fall
//!   back to the 3rd and 5th whitespace-separated tokens.
//! - Every following line is one clause: signed integers terminated by `0`.
//!   Nothing may follow the `0`. Blank lines and `c` comment lines are skipped.
//! - The declared clause count is reported as-is and never checked against
//!   the clauses actually read.
//! - A line consisting of a lone `%` ends the clause list; anything after it
//!   is ignored.
//!
//! Clause lines with more than four tokens have their first token dropped
//! before literals are built, truncating them to the expected 3-literal width.
//! This keeps compatibility with problem sets whose lines carry a leading
//! extra column. `ParseOptions::drop_leading_token_on_wide_lines` turns it off.

use crate::sat::clause::Clause;
use crate::sat::cnf::Formula;
use crate::sat::literal::Literal;
use std::io::{self, BufRead};
use std::path::Path;
use thiserror::Error;

/// Token count above which a clause line loses its first token.
const WIDE_LINE_TOKENS: usize = 4;

/// Upper bound on the clause capacity reserved from the header.
const MAX_RESERVED_CLAUSES: usize = 1 << 16;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("input ended before the header line")]
    MissingHeader,

    #[error("line {line}: invalid header: {reason}")]
    InvalidHeader { line: usize, reason: String },

    #[error("line {line}: failed to parse literal '{token}' as an integer")]
    InvalidLiteral { line: usize, token: String },

    #[error("line {line}: clause is not terminated by 0")]
    MissingTerminator { line: usize },

    #[error("line {line}: unexpected '{token}' after the terminating 0")]
    TrailingToken { line: usize, token: String },

    #[error("line {line}: clause has no literals")]
    EmptyClause { line: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Knobs for input-format compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Drop the first token of any clause line with more than four tokens.
    pub drop_leading_token_on_wide_lines: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            drop_leading_token_on_wide_lines: true,
        }
    }
}

/// Parses problem text with the default options.
///
/// # Errors
///
/// See [`parse_dimacs`].
pub fn parse_str(text: &str) -> Result<Formula, FormatError> {
    parse_dimacs(text.as_bytes(), ParseOptions::default())
}

/// Parses a problem from a `BufRead` source into a `Formula`.
///
/// # Errors
///
/// - `FormatError::MissingHeader` when the input has fewer than two lines.
/// - `FormatError::InvalidHeader` when the header counts are missing or not integers.
/// - `FormatError::InvalidLiteral`, `MissingTerminator`, `TrailingToken` or `EmptyClause`
///   for a bad clause line.
/// - `FormatError::Io` when reading fails.
pub fn parse_dimacs<R: BufRead>(reader: R, options: ParseOptions) -> Result<Formula, FormatError> {
    let mut lines = reader.lines();

    // line 1 is a placeholder
    lines.next().transpose()?.ok_or(FormatError::MissingHeader)?;
    let header = lines.next().transpose()?.ok_or(FormatError::MissingHeader)?;
    let (variables, num_clauses) = parse_header(&header, 2)?;

    let mut clauses = Vec::with_capacity(num_clauses.min(MAX_RESERVED_CLAUSES));

    for (idx, line) in lines.enumerate() {
        let line = line?;
        let line_no = idx + 3;
        let mut tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.first() {
            None | Some(&"c") => continue,
            Some(&"%") if tokens.len() == 1 => break,
            Some(_) => {}
        }

        if options.drop_leading_token_on_wide_lines && tokens.len() > WIDE_LINE_TOKENS {
            tokens.remove(0);
        }

        clauses.push(parse_clause(&tokens, line_no)?);
    }

    Ok(Formula::new(clauses, variables, num_clauses))
}

/// Opens and parses a problem file.
///
/// # Errors
///
/// `FormatError::Io` if the file cannot be opened, otherwise as [`parse_dimacs`].
pub fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> Result<Formula, FormatError> {
    let file = std::fs::File::open(path)?;
    parse_dimacs(io::BufReader::new(file), options)
}

fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize), FormatError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    let (vars_idx, clauses_idx) = tokens
        .iter()
        .position(|&t| t == "cnf")
        .map_or((2, 4), |k| (k + 1, k + 2));

    let count = |idx: usize, what: &str| -> Result<usize, FormatError> {
        let token = tokens.get(idx).ok_or_else(|| FormatError::InvalidHeader {
            line: line_no,
            reason: format!("missing {what} count in '{}'", line.trim()),
        })?;
        token.parse::<usize>().map_err(|e| FormatError::InvalidHeader {
            line: line_no,
            reason: format!("{what} count '{token}': {e}"),
        })
    };

    Ok((count(vars_idx, "variable")?, count(clauses_idx, "clause")?))
}

fn parse_clause(tokens: &[&str], line_no: usize) -> Result<Clause, FormatError> {
    let values = tokens
        .iter()
        .map(|&token| {
            token
                .parse::<i32>()
                .map_err(|_| FormatError::InvalidLiteral {
                    line: line_no,
                    token: token.to_string(),
                })
        })
        .collect::<Result<Vec<i32>, _>>()?;

    let end = values
        .iter()
        .position(|&v| v == 0)
        .ok_or(FormatError::MissingTerminator { line: line_no })?;

    if end == 0 {
        return Err(FormatError::EmptyClause { line: line_no });
    }

    if let Some(&token) = tokens.get(end + 1) {
        return Err(FormatError::TrailingToken {
            line: line_no,
            token: token.to_string(),
        });
    }

    Ok(Clause::new(
        values[..end].iter().copied().filter_map(Literal::from_dimacs),
    ))
}
