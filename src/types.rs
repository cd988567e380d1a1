//! Shared vocabulary of the search core: coordinates, movement policies, engine status and the
//! error taxonomy.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid coordinate addressed by row and column.
///
/// Rows grow downwards and columns grow to the right. A coordinate carries no knowledge of the
/// grid it belongs to, so whether it is in range is always decided by the [`Grid`] it is used
/// with.
///
/// [`Grid`]: crate::grid::Grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Row index, counted from the top edge.
    pub row: usize,
    /// Column index, counted from the left edge.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate from a row and a column.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Returns the coordinate displaced by the given signed row and column deltas.
    ///
    /// This function returns [`None`] when the displacement would move past the top or left
    /// edge, which is the only overflow a `usize` coordinate can express on its own.
    #[must_use]
    pub const fn offset(self, delta_row: isize, delta_col: isize) -> Option<Self> {
        let Some(row) = self.row.checked_add_signed(delta_row) else {
            return None;
        };
        let Some(col) = self.col.checked_add_signed(delta_col) else {
            return None;
        };

        Some(Self { row, col })
    }

    /// Absolute row and column distance to another coordinate.
    #[must_use]
    pub const fn delta(self, other: Self) -> (usize, usize) {
        (self.row.abs_diff(other.row), self.col.abs_diff(other.col))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "({}, {})", self.row, self.col)
    }
}

/// Movement policy of a grid.
///
/// This enumeration decides which cells count as neighbours of a given cell, and therefore which
/// moves the search engine may take.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum Neighborhood {
    /// Orthogonal moves only.
    #[default]
    Four,
    /// Orthogonal and diagonal moves.
    Eight,
}

impl Neighborhood {
    /// Name of the policy as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Four => "four",
            Self::Eight => "eight",
        }
    }
}

/// Lifecycle state of the search engine.
///
/// The engine starts [`Idle`](Status::Idle), becomes [`Running`](Status::Running) once
/// initialised and ends in one of the two terminal states. Only an explicit reset leaves a
/// terminal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// No search has been set up.
    #[default]
    Idle,
    /// A search is in progress and can be stepped.
    Running,
    /// The goal was reached and a path is available.
    Succeeded,
    /// The open set ran dry before the goal was reached.
    Failed,
}

impl Status {
    /// Whether this status is one of the two terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Human readable label used by the viewer and in log lines.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Errors raised by the grid, the search engine and the trace recorder.
///
/// Construction errors ([`InvalidDimension`](Self::InvalidDimension),
/// [`OutOfRange`](Self::OutOfRange), [`InvalidCoordinate`](Self::InvalidCoordinate),
/// [`InvalidCost`](Self::InvalidCost)) are caller mistakes and are reported immediately.
/// [`StepLimitExceeded`](Self::StepLimitExceeded) is recoverable: the search is still running
/// and may be resumed. An exhausted open set is not an error, it is the
/// [`Failed`](Status::Failed) status.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    /// A grid was requested with a zero width or height.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimension {
        /// Requested number of columns.
        width: usize,
        /// Requested number of rows.
        height: usize,
    },
    /// A coordinate supplied to the grid lies outside of it.
    #[error("coordinate {coord} lies outside the {width}x{height} grid")]
    OutOfRange {
        /// Offending coordinate.
        coord: Coord,
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },
    /// A start or goal coordinate cannot be searched from or towards.
    #[error("{coord} cannot be used as an endpoint: {reason}")]
    InvalidCoordinate {
        /// Offending coordinate.
        coord: Coord,
        /// Why the coordinate was refused.
        reason: &'static str,
    },
    /// A traversal cost is negative or not finite.
    #[error("cell {coord} has invalid traversal cost {cost}")]
    InvalidCost {
        /// Cell whose cost was rejected.
        coord: Coord,
        /// Rejected cost.
        cost: f64,
    },
    /// The heuristic produced a negative or non-finite estimate.
    #[error("heuristic estimate {value} at {coord} is not a non-negative finite number")]
    InvalidHeuristic {
        /// Coordinate the estimate was computed for.
        coord: Coord,
        /// Rejected estimate.
        value: f64,
    },
    /// A bulk run spent its step budget while the search was still running.
    #[error("search still running after {limit} steps")]
    StepLimitExceeded {
        /// Budget that was exhausted.
        limit: usize,
    },
    /// A trace lookup fell outside the recorded range.
    #[error("trace index {index} out of range for {len} recorded states")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of recorded states.
        len: usize,
    },
    /// The engine was stepped before being initialised.
    #[error("the search engine has not been initialised")]
    NotInitialized,
    /// An operation was attempted in a state that does not allow it.
    #[error("cannot {operation} while the search is {status}")]
    InvalidState {
        /// Attempted operation.
        operation: &'static str,
        /// Engine status at the time of the attempt.
        status: Status,
    },
    /// The trace could not be serialised.
    #[error("failed to export trace: {0}")]
    Export(String),
}
