#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Consumers of a walk's event stream.
//!
//! The search engine only produces [`Event`]s. Anything that persists or
//! plots a run implements [`TraceRecorder`] and is fed the events in order,
//! after a [`RunSummary`] describing the starting point.
//!
//! - [`SolutionFile`] writes the plain-text step log.
//! - [`UnsatSeries`] collects the unsatisfied-clause count of every evaluated
//!   assignment, which is what a chart of the run is drawn from.

use crate::sat::assignment::Assignment;
use crate::sat::schoning::{Event, TerminalEvent};
use std::io::{self, Write};

const SEPARATOR: &str = "***********************************************";

/// What a recorder learns before the first event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub initial_assignment: Assignment,
    pub variables: usize,
    /// The clause count declared by the input header.
    pub num_clauses: usize,
}

/// A sink for one walk: a summary, then its events in order, then `finish`.
pub trait TraceRecorder {
    /// Called once, before any event.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying sink.
    fn begin(&mut self, summary: &RunSummary) -> io::Result<()>;

    /// Called once per event, in stream order.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying sink.
    fn record(&mut self, event: &Event) -> io::Result<()>;

    /// Called after the terminal event.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying sink.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Feeds a summary and a whole event stream to `recorder`, returning the
/// terminal event if the stream had one.
///
/// # Errors
///
/// The first error returned by the recorder; the remaining events are not consumed.
pub fn record_all<T, I>(
    recorder: &mut T,
    summary: &RunSummary,
    events: I,
) -> io::Result<Option<TerminalEvent>>
where
    T: TraceRecorder + ?Sized,
    I: IntoIterator<Item = Event>,
{
    recorder.begin(summary)?;
    let mut terminal = None;
    for event in events {
        recorder.record(&event)?;
        if let Event::Terminal(t) = event {
            terminal = Some(t);
        }
    }
    recorder.finish()?;
    Ok(terminal)
}

/// The step-by-step text log of a walk.
#[derive(Debug)]
pub struct SolutionFile<W: Write> {
    out: W,
}

impl<W: Write> SolutionFile<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    /// Hands back the writer, e.g. to inspect an in-memory log.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TraceRecorder for SolutionFile<W> {
    fn begin(&mut self, summary: &RunSummary) -> io::Result<()> {
        writeln!(self.out, "Initial assignment: {}", summary.initial_assignment)?;
        writeln!(self.out, "Number of variables: {}", summary.variables)?;
        writeln!(self.out, "Number of clauses: {}", summary.num_clauses)
    }

    fn record(&mut self, event: &Event) -> io::Result<()> {
        match event {
            Event::Iteration(it) => {
                writeln!(self.out, "\n{SEPARATOR} iteration no.{}", it.index)?;
                writeln!(self.out, "Satisfactory Clauses: {}", it.satisfied_clauses)?;
                writeln!(self.out, "Unsatisfactory Clauses: {}", it.unsatisfied_clauses)?;
                match it.flipped_variable {
                    Some(var) => writeln!(self.out, " - Variable to Change: {var}")?,
                    None => writeln!(self.out, " - Variable to Change: N/A")?,
                }
                writeln!(self.out, "New assignment: {}", it.assignment)
            }
            Event::Terminal(TerminalEvent::Found {
                iteration,
                assignment,
                ..
            }) => {
                writeln!(self.out, "\n{SEPARATOR} iteration no.{iteration}")?;
                writeln!(self.out, "Solution Found: {assignment}")
            }
            Event::Terminal(TerminalEvent::NotFound { iterations }) => {
                writeln!(self.out, "\n{SEPARATOR}")?;
                writeln!(self.out, "No solution found in {iterations} iterations")
            }
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Unsatisfied-clause counts of a run, in evaluation order, for charting.
///
/// A run that finds a solution ends with a `0` entry for the satisfying
/// evaluation. `iterations` is the number of plotted points.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnsatSeries {
    pub title: String,
    pub counts: Vec<usize>,
    pub iterations: usize,
}

impl UnsatSeries {
    /// An empty series. `title` names the chart and its data file.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Collects a series straight from an event stream.
    pub fn from_events<'e>(
        title: impl Into<String>,
        events: impl IntoIterator<Item = &'e Event>,
    ) -> Self {
        let mut series = Self::new(title);
        for event in events {
            series.push(event);
        }
        series
    }

    fn push(&mut self, event: &Event) {
        if let Some(count) = event.unsatisfied_clauses() {
            self.counts.push(count);
            self.iterations = self.counts.len();
        }
    }

    /// Writes the series as whitespace-separated `iteration unsatisfied` rows
    /// (1-based iteration numbers) under a `#` title line.
    ///
    /// # Errors
    ///
    /// Any I/O error from `out`.
    pub fn write_data<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "# {}", self.title)?;
        for (i, count) in self.counts.iter().enumerate() {
            writeln!(out, "{} {count}", i + 1)?;
        }
        out.flush()
    }
}

impl TraceRecorder for UnsatSeries {
    fn begin(&mut self, _: &RunSummary) -> io::Result<()> {
        self.counts.clear();
        self.iterations = 0;
        Ok(())
    }

    fn record(&mut self, event: &Event) -> io::Result<()> {
        self.push(event);
        Ok(())
    }
}

/// Forwards every call to each recorder in turn.
impl TraceRecorder for [&mut dyn TraceRecorder] {
    fn begin(&mut self, summary: &RunSummary) -> io::Result<()> {
        self.iter_mut().try_for_each(|r| r.begin(summary))
    }

    fn record(&mut self, event: &Event) -> io::Result<()> {
        self.iter_mut().try_for_each(|r| r.record(event))
    }

    fn finish(&mut self) -> io::Result<()> {
        self.iter_mut().try_for_each(|r| r.finish())
    }
}
