//! Step-driven A* search engine.
//!
//! This module contains the [`Engine`] state machine, which performs exactly one node expansion per
//! call to [`Engine::step`], and the [`Snapshot`] type, which exposes everything the engine knows
//! after each call. A host drives the engine from its own loop, one step per frame or all at once
//! through [`Engine::run_to_completion`], and keeps the snapshots for later replay.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    grid::Grid,
    heuristic::Heuristic,
    types::{Coord, SearchError, Status},
};

/// Bookkeeping for one discovered coordinate.
///
/// A record is created the first time a coordinate is discovered and updated whenever a cheaper
/// way of reaching it turns up. Records are never removed one at a time. They are all dropped
/// together when the engine is reset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Coordinate the record describes.
    pub coord: Coord,
    /// Cost of the cheapest known path from the start.
    pub g_cost: f64,
    /// Heuristic estimate of the remaining cost to the goal.
    pub h_cost: f64,
    /// Sum of [`g_cost`](Self::g_cost) and [`h_cost`](Self::h_cost).
    pub f_cost: f64,
    /// Predecessor on the cheapest known path, [`None`] for the start.
    pub parent: Option<Coord>,
    /// Discovery sequence number, used as the final tie-breaker.
    pub order: u64,
}

/// Immutable picture of the engine state after one call.
///
/// A snapshot carries the complete search state: a renderer, or a replay of recorded snapshots,
/// never needs to query the engine itself.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of expansions performed so far, including the one that ended the search.
    pub step: usize,
    /// Engine status after the call.
    pub status: Status,
    /// Coordinate expanded by the call, if any.
    pub current: Option<Coord>,
    /// Open set in the order the engine will expand it.
    pub open: Vec<Coord>,
    /// Closed set in expansion order.
    pub closed: Vec<Coord>,
    /// Path from the start to [`current`](Self::current) while running, from the start to the
    /// goal on success, and empty otherwise.
    pub path: Vec<Coord>,
    /// Every node record in discovery order.
    pub nodes: Vec<NodeRecord>,
}

impl Snapshot {
    /// Record for `coord`, if it has been discovered.
    #[must_use]
    pub fn node(&self, coord: Coord) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.coord == coord)
    }

    /// Accumulated cost of [`path`](Self::path), or [`None`] when the path is empty.
    #[must_use]
    pub fn path_cost(&self) -> Option<f64> {
        self.path
            .last()
            .and_then(|coord| self.node(*coord))
            .map(|node| node.g_cost)
    }

    /// Whether the snapshot was taken in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Search engine state machine.
///
/// The engine moves from [`Status::Idle`] to [`Status::Running`] on
/// [`initialize`](Engine::initialize). It ends in [`Status::Succeeded`] or [`Status::Failed`],
/// and only [`reset`](Engine::reset) brings it back to [`Status::Idle`]. It performs no work on
/// its own: every transition happens inside a call made by the host.
pub struct Engine {
    /// Current lifecycle state.
    status: Status,
    /// Expansions performed since initialisation.
    steps: usize,
    /// Search data, present from initialisation until reset.
    run: Option<Run>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an idle engine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: Status::Idle,
            steps: 0,
            run: None,
        }
    }

    /// Prepares a search from `start` to `goal` over `grid` and returns the seeded snapshot.
    ///
    /// The engine takes ownership of the grid, so the grid cannot change while the search is
    /// active. The open set is seeded with `start` at zero cost.
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - The engine is not idle ([`SearchError::InvalidState`])
    /// - `start` or `goal` is outside the grid or blocked ([`SearchError::InvalidCoordinate`])
    /// - The heuristic estimate for `start` is negative or not finite
    ///   ([`SearchError::InvalidHeuristic`])
    pub fn initialize<H>(
        &mut self,
        grid: Grid,
        start: Coord,
        goal: Coord,
        heuristic: H,
    ) -> Result<Snapshot, SearchError>
    where
        H: Heuristic + 'static,
    {
        if self.status != Status::Idle {
            return Err(SearchError::InvalidState {
                operation: "initialise",
                status: self.status,
            });
        }

        check_endpoint(&grid, start)?;
        check_endpoint(&grid, goal)?;
        let h_cost = estimate(&heuristic, start, goal)?;

        debug!(
            %start,
            %goal,
            width = grid.width(),
            height = grid.height(),
            neighborhood = ?grid.neighborhood(),
            "search initialised"
        );

        let mut run = Run::new(grid, start, goal, Box::new(heuristic));
        run.discover(start, 0., h_cost, None);

        self.run = Some(run);
        self.status = Status::Running;
        self.steps = 0;

        Ok(self.snapshot())
    }

    /// Performs exactly one expansion and returns the resulting snapshot.
    ///
    /// In a terminal state this returns the unchanged terminal snapshot. A failed heuristic
    /// check leaves the engine exactly as it was before the call.
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - The engine has not been initialised ([`SearchError::NotInitialized`])
    /// - The heuristic yields an invalid estimate for a newly discovered coordinate
    ///   ([`SearchError::InvalidHeuristic`])
    pub fn step(&mut self) -> Result<Snapshot, SearchError> {
        let Some(run) = self.run.as_mut() else {
            return Err(SearchError::NotInitialized);
        };
        if self.status.is_terminal() {
            return Ok(self.snapshot());
        }

        let expansion = run.expand()?;
        self.steps += 1;

        match expansion {
            Expansion::Exhausted => {
                self.status = Status::Failed;
                debug!(steps = self.steps, "open set exhausted, goal unreachable");
            }
            Expansion::Reached => {
                self.status = Status::Succeeded;
                debug!(
                    steps = self.steps,
                    length = run.path.len(),
                    "goal reached"
                );
            }
            Expansion::Continued => {}
        }

        Ok(self.snapshot())
    }

    /// Steps until the search terminates or `limit` steps have been taken.
    ///
    /// # Errors
    ///
    /// - [`SearchError::StepLimitExceeded`] when the search is still running after `limit`
    ///   steps. Calling this function again resumes the search.
    /// - Any error of [`Engine::step`].
    pub fn run_to_completion(&mut self, limit: usize) -> Result<Snapshot, SearchError> {
        self.run_to_completion_with(limit, |_| {})
    }

    /// Same as [`Engine::run_to_completion`], handing every intermediate snapshot to `observe`.
    ///
    /// # Errors
    ///
    /// See [`Engine::run_to_completion`].
    pub fn run_to_completion_with<F>(
        &mut self,
        limit: usize,
        mut observe: F,
    ) -> Result<Snapshot, SearchError>
    where
        F: FnMut(&Snapshot),
    {
        if self.run.is_none() {
            return Err(SearchError::NotInitialized);
        }

        let mut snapshot = self.snapshot();
        let mut taken = 0;
        while self.status == Status::Running {
            if taken == limit {
                debug!(limit, steps = self.steps, "step limit reached");
                return Err(SearchError::StepLimitExceeded { limit });
            }
            snapshot = self.step()?;
            taken += 1;
            observe(&snapshot);
        }

        Ok(snapshot)
    }

    /// Discards all search data and returns to [`Status::Idle`].
    pub fn reset(&mut self) {
        if self.run.take().is_some() {
            debug!(status = %self.status, steps = self.steps, "search reset");
        }
        self.status = Status::Idle;
        self.steps = 0;
    }

    /// Snapshot of the current state without advancing the search.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let Some(run) = &self.run else {
            return Snapshot::default();
        };

        Snapshot {
            step: self.steps,
            status: self.status,
            current: run.current,
            open: run.open.iter().map(|key| key.coord).collect(),
            closed: run.closed.clone(),
            path: run.path.clone(),
            nodes: run
                .discovered
                .iter()
                .filter_map(|coord| run.node(*coord))
                .map(|node| node.record)
                .collect(),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Expansions performed since initialisation.
    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Grid being searched, if the engine is initialised.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.run.as_ref().map(|run| &run.grid)
    }

    /// Start coordinate, if the engine is initialised.
    #[must_use]
    pub fn start(&self) -> Option<Coord> {
        self.run.as_ref().map(|run| run.start)
    }

    /// Goal coordinate, if the engine is initialised.
    #[must_use]
    pub fn goal(&self) -> Option<Coord> {
        self.run.as_ref().map(|run| run.goal)
    }
}

/// Outcome of a single expansion.
enum Expansion {
    /// The open set was empty.
    Exhausted,
    /// The goal was popped from the open set.
    Reached,
    /// A non-goal coordinate was expanded.
    Continued,
}

/// Open-set entry ordered by f-cost, then h-cost, then discovery order.
#[derive(Clone, Copy, Debug)]
struct OpenKey {
    /// Priority.
    f_cost: f64,
    /// First tie-breaker.
    h_cost: f64,
    /// Second tie-breaker, unique per coordinate.
    order: u64,
    /// Cost so far, carried along so expansion needs no extra lookup.
    g_cost: f64,
    /// Coordinate the entry stands for.
    coord: Coord,
}

impl Ord for OpenKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .total_cmp(&other.f_cost)
            .then_with(|| self.h_cost.total_cmp(&other.h_cost))
            .then_with(|| self.order.cmp(&other.order))
    }
}

impl PartialOrd for OpenKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenKey {}

/// Node record plus closed-set membership.
#[derive(Clone, Copy, Debug)]
struct Node {
    /// Public part of the node.
    record: NodeRecord,
    /// Whether the node has been expanded.
    closed: bool,
}

impl Node {
    /// Open-set key matching the current record.
    const fn key(&self) -> OpenKey {
        OpenKey {
            f_cost: self.record.f_cost,
            h_cost: self.record.h_cost,
            order: self.record.order,
            g_cost: self.record.g_cost,
            coord: self.record.coord,
        }
    }
}

/// Data of an initialised search.
struct Run {
    /// Grid owned for the duration of the search.
    grid: Grid,
    /// Start coordinate.
    start: Coord,
    /// Goal coordinate.
    goal: Coord,
    /// Estimate towards the goal.
    heuristic: Box<dyn Heuristic>,
    /// Node table indexed by the grid's row-major cell index.
    nodes: Vec<Option<Node>>,
    /// Coordinates in discovery order.
    discovered: Vec<Coord>,
    /// Next discovery sequence number.
    next_order: u64,
    /// Discovered but unexpanded coordinates.
    open: BTreeSet<OpenKey>,
    /// Expanded coordinates in expansion order.
    closed: Vec<Coord>,
    /// Coordinate expanded by the latest step.
    current: Option<Coord>,
    /// Path to [`current`](Run::current).
    path: Vec<Coord>,
}

impl Run {
    /// Creates empty search data over `grid`.
    fn new(grid: Grid, start: Coord, goal: Coord, heuristic: Box<dyn Heuristic>) -> Self {
        let nodes = vec![None; grid.len()];
        Self {
            grid,
            start,
            goal,
            heuristic,
            nodes,
            discovered: Vec::new(),
            next_order: 0,
            open: BTreeSet::new(),
            closed: Vec::new(),
            current: None,
            path: Vec::new(),
        }
    }

    /// Node stored for `coord`, if discovered.
    fn node(&self, coord: Coord) -> Option<&Node> {
        self.grid
            .index_of(coord)
            .and_then(|idx| self.nodes.get(idx))
            .and_then(Option::as_ref)
    }

    /// Pops the best open coordinate, closes it and relaxes its neighbours.
    ///
    /// All fallible work happens before the first mutation, so an error leaves the search
    /// untouched.
    fn expand(&mut self) -> Result<Expansion, SearchError> {
        let Some(key) = self.open.first().copied() else {
            self.current = None;
            self.path.clear();
            return Ok(Expansion::Exhausted);
        };
        let current = key.coord;

        let mut updates = Vec::new();
        if current != self.goal {
            for edge in self.grid.neighbors_of(current) {
                let g_cost = key.g_cost + edge.cost;
                match self.node(edge.to) {
                    Some(node) if node.closed || g_cost >= node.record.g_cost => {}
                    Some(node) => updates.push((edge.to, g_cost, node.record.h_cost)),
                    None => {
                        let h_cost = estimate(&*self.heuristic, edge.to, self.goal)?;
                        updates.push((edge.to, g_cost, h_cost));
                    }
                }
            }
        }

        let _ = self.open.remove(&key);
        if let Some(node) = self
            .grid
            .index_of(current)
            .and_then(|idx| self.nodes.get_mut(idx))
            .and_then(Option::as_mut)
        {
            node.closed = true;
        }
        self.closed.push(current);
        self.current = Some(current);

        trace!(
            %current,
            f_cost = key.f_cost,
            g_cost = key.g_cost,
            relaxed = updates.len(),
            "expanded"
        );

        for (coord, g_cost, h_cost) in updates {
            self.discover(coord, g_cost, h_cost, Some(current));
        }
        self.path = self.trace_back(current);

        if current == self.goal {
            Ok(Expansion::Reached)
        } else {
            Ok(Expansion::Continued)
        }
    }

    /// Inserts a new node or lowers the cost of an existing one, keeping the open set in sync.
    fn discover(&mut self, coord: Coord, g_cost: f64, h_cost: f64, parent: Option<Coord>) {
        let Some(slot) = self
            .grid
            .index_of(coord)
            .and_then(|idx| self.nodes.get_mut(idx))
        else {
            return;
        };

        match slot {
            Some(node) => {
                let _ = self.open.remove(&node.key());
                node.record.g_cost = g_cost;
                node.record.f_cost = g_cost + node.record.h_cost;
                node.record.parent = parent;
                let _ = self.open.insert(node.key());
            }
            None => {
                let node = Node {
                    record: NodeRecord {
                        coord,
                        g_cost,
                        h_cost,
                        f_cost: g_cost + h_cost,
                        parent,
                        order: self.next_order,
                    },
                    closed: false,
                };
                self.next_order += 1;
                let _ = self.open.insert(node.key());
                self.discovered.push(coord);
                *slot = Some(node);
            }
        }
    }

    /// Follows parent links from `coord` back to the start and returns the path start first.
    fn trace_back(&self, coord: Coord) -> Vec<Coord> {
        let mut path = vec![coord];
        let mut cursor = coord;
        while let Some(parent) = self.node(cursor).and_then(|node| node.record.parent) {
            // Parent links form a tree, so a path can never outgrow the node table.
            if path.len() > self.discovered.len() {
                break;
            }
            path.push(parent);
            cursor = parent;
        }
        path.reverse();
        path
    }
}

/// Validates a start or goal coordinate.
fn check_endpoint(grid: &Grid, coord: Coord) -> Result<(), SearchError> {
    if !grid.contains(coord) {
        return Err(SearchError::InvalidCoordinate {
            coord,
            reason: "outside the grid",
        });
    }
    if grid.is_blocked(coord) {
        return Err(SearchError::InvalidCoordinate {
            coord,
            reason: "cell is blocked",
        });
    }

    Ok(())
}

/// Evaluates the heuristic and rejects negative or non-finite estimates.
fn estimate<H>(heuristic: &H, coord: Coord, goal: Coord) -> Result<f64, SearchError>
where
    H: Heuristic + ?Sized,
{
    let value = heuristic.estimate(coord, goal);
    if value.is_finite() && value >= 0. {
        Ok(value)
    } else {
        Err(SearchError::InvalidHeuristic { coord, value })
    }
}
