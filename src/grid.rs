//! Grid model used as the search substrate.
//!
//! This module contains the [`Grid`] structure, a fixed-size rectangle of weighted cells that may
//! be blocked, along with the neighbour policy that turns it into a graph for the search engine.

use std::f64::consts::SQRT_2;

use serde::{Deserialize, Serialize};

use crate::types::{Coord, Neighborhood, SearchError};

/// Row and column deltas of orthogonal moves: up, down, right, left.
const ORTHOGONAL: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];

/// Row and column deltas of diagonal moves: up-right, down-right, down-left, up-left.
const DIAGONAL: [(isize, isize); 4] = [(-1, 1), (1, 1), (1, -1), (-1, -1)];

/// A single grid cell.
///
/// The traversal cost is the price of entering the cell with an orthogonal move. A blocked cell
/// is never entered, whatever its cost.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Non-negative, finite cost of entering this cell.
    pub cost: f64,
    /// Whether the cell is a wall.
    pub blocked: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            cost: 1.,
            blocked: false,
        }
    }
}

/// A legal move out of a cell together with its cost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    /// Destination of the move.
    pub to: Coord,
    /// Cost of taking the move.
    pub cost: f64,
}

/// Rectangular mapping of coordinates to cells.
///
/// The dimensions are fixed at construction and every coordinate in range owns exactly one cell.
/// A grid is never mutated in place once built: toggling a wall produces a new grid through
/// [`Grid::with_blocked`], so a grid handed to the search engine cannot change under it.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    /// Number of columns.
    width: usize,
    /// Number of rows.
    height: usize,
    /// Movement policy used by [`Grid::neighbors_of`].
    neighborhood: Neighborhood,
    /// Cells in row-major order.
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid from its dimensions, the set of blocked cells and per-cell cost overrides.
    ///
    /// Cells not mentioned are open with cost 1. The neighbour policy starts out as
    /// [`Neighborhood::Four`] and can be changed with [`Grid::with_neighborhood`].
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - Either dimension is zero ([`SearchError::InvalidDimension`])
    /// - A blocked coordinate or cost override lies outside the grid
    ///   ([`SearchError::OutOfRange`])
    /// - A cost override is negative or not finite ([`SearchError::InvalidCost`])
    pub fn build<B, C>(width: usize, height: usize, blocked: B, costs: C) -> Result<Self, SearchError>
    where
        B: IntoIterator<Item = Coord>,
        C: IntoIterator<Item = (Coord, f64)>,
    {
        let len = width
            .checked_mul(height)
            .filter(|len| *len > 0)
            .ok_or(SearchError::InvalidDimension { width, height })?;

        let mut grid = Self {
            width,
            height,
            neighborhood: Neighborhood::default(),
            cells: vec![Cell::default(); len],
        };

        for coord in blocked {
            grid.cell_mut(coord)?.blocked = true;
        }
        for (coord, cost) in costs {
            if !cost.is_finite() || cost < 0. {
                return Err(SearchError::InvalidCost { coord, cost });
            }
            grid.cell_mut(coord)?.cost = cost;
        }

        Ok(grid)
    }

    /// Builds a grid with no walls and uniform cost.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidDimension`] if either dimension is zero.
    pub fn open(width: usize, height: usize) -> Result<Self, SearchError> {
        Self::build(width, height, [], [])
    }

    /// Returns the same grid with a different neighbour policy.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: Neighborhood) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    /// Returns a copy of this grid with the blocked flag of one cell set to `blocked`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::OutOfRange`] if `coord` lies outside the grid.
    pub fn with_blocked(&self, coord: Coord, blocked: bool) -> Result<Self, SearchError> {
        let mut grid = self.clone();
        grid.cell_mut(coord)?.blocked = blocked;
        Ok(grid)
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Active neighbour policy.
    #[must_use]
    pub const fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    /// Whether `coord` addresses a cell of this grid.
    #[must_use]
    pub const fn contains(&self, coord: Coord) -> bool {
        coord.row < self.height && coord.col < self.width
    }

    /// Row-major index of `coord`, or [`None`] when it lies outside the grid.
    #[must_use]
    pub const fn index_of(&self, coord: Coord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.row * self.width + coord.col)
        } else {
            None
        }
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; a grid has at least one cell. Present to pair with [`Grid::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The cell at `coord`, if any.
    #[must_use]
    pub fn cell(&self, coord: Coord) -> Option<Cell> {
        self.index_of(coord)
            .and_then(|idx| self.cells.get(idx))
            .copied()
    }

    /// Whether `coord` is a wall. Coordinates outside the grid count as walls.
    #[must_use]
    pub fn is_blocked(&self, coord: Coord) -> bool {
        self.cell(coord).is_none_or(|cell| cell.blocked)
    }

    /// Cost of entering `coord` orthogonally, or [`None`] when it lies outside the grid.
    #[must_use]
    pub fn cost_of(&self, coord: Coord) -> Option<f64> {
        self.cell(coord).map(|cell| cell.cost)
    }

    /// Cheapest traversal cost among open cells, or [`None`] when every cell is blocked.
    #[must_use]
    pub fn min_cost(&self) -> Option<f64> {
        self.cells
            .iter()
            .filter(|cell| !cell.blocked)
            .map(|cell| cell.cost)
            .min_by(f64::total_cmp)
    }

    /// Legal moves out of `coord` under the active neighbour policy.
    ///
    /// Orthogonal moves come first in the order up, down, right, left, followed by the diagonals
    /// up-right, down-right, down-left and up-left when diagonals are enabled. The order is fixed
    /// because the search engine breaks ties by discovery order. Blocked destinations are left
    /// out, and so is a diagonal whose two flanking orthogonal cells are both walls. A diagonal
    /// move costs √2 times the destination cost.
    #[must_use]
    pub fn neighbors_of(&self, coord: Coord) -> Vec<Edge> {
        let mut edges = Vec::with_capacity(8);
        if !self.contains(coord) {
            return edges;
        }

        for (delta_row, delta_col) in ORTHOGONAL {
            if let Some(to) = coord.offset(delta_row, delta_col) {
                if let Some(cell) = self.cell(to).filter(|cell| !cell.blocked) {
                    edges.push(Edge {
                        to,
                        cost: cell.cost,
                    });
                }
            }
        }

        if self.neighborhood == Neighborhood::Eight {
            for (delta_row, delta_col) in DIAGONAL {
                let Some(to) = coord.offset(delta_row, delta_col) else {
                    continue;
                };
                let Some(cell) = self.cell(to).filter(|cell| !cell.blocked) else {
                    continue;
                };

                // Both flanking cells are in range whenever the diagonal target is.
                let vertical = Coord::new(to.row, coord.col);
                let horizontal = Coord::new(coord.row, to.col);
                if self.is_blocked(vertical) && self.is_blocked(horizontal) {
                    continue;
                }

                edges.push(Edge {
                    to,
                    cost: cell.cost * SQRT_2,
                });
            }
        }

        edges
    }

    /// Whether moving from `from` to `to` is a single legal move.
    #[must_use]
    pub fn is_legal_move(&self, from: Coord, to: Coord) -> bool {
        self.neighbors_of(from).iter().any(|edge| edge.to == to)
    }

    /// Iterates over every coordinate in row-major order.
    pub fn coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |row| (0..self.width).map(move |col| Coord::new(row, col)))
    }

    /// Iterates over the coordinates of all blocked cells in row-major order.
    pub fn blocked_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        self.coords().filter(|coord| self.is_blocked(*coord))
    }

    /// Mutable access used during construction.
    fn cell_mut(&mut self, coord: Coord) -> Result<&mut Cell, SearchError> {
        let (width, height) = (self.width, self.height);
        self.index_of(coord)
            .and_then(|idx| self.cells.get_mut(idx))
            .ok_or(SearchError::OutOfRange {
                coord,
                width,
                height,
            })
    }
}
