//! Host-side pairing of a search engine with the trace of its states.

use tracing::info;

use crate::{
    engine::{Engine, Snapshot},
    grid::Grid,
    heuristic::Heuristic,
    trace::Trace,
    types::{Coord, SearchError, Status},
};

/// An engine together with the trace recording every state it passes through.
///
/// Every call that advances the engine appends the resulting snapshot to the trace, so the trace
/// is always a faithful replay source for the run.
#[derive(Default)]
pub struct Session {
    /// Engine driven by this session.
    engine: Engine,
    /// Snapshots produced so far.
    trace: Trace,
}

impl Session {
    /// Creates a session with an idle engine and an empty trace.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            engine: Engine::new(),
            trace: Trace::new(),
        }
    }

    /// Initialises the engine and records the seed snapshot.
    ///
    /// # Errors
    ///
    /// Any error of [`Engine::initialize`].
    pub fn start<H>(
        &mut self,
        grid: Grid,
        start: Coord,
        goal: Coord,
        heuristic: H,
    ) -> Result<&Snapshot, SearchError>
    where
        H: Heuristic + 'static,
    {
        let seed = self.engine.initialize(grid, start, goal, heuristic)?;
        self.trace.record(seed);
        self.latest()
    }

    /// Advances the engine by one step and records the result.
    ///
    /// Once the search has terminated this returns the terminal snapshot without recording it
    /// again, even after the trace has been cleared.
    ///
    /// # Errors
    ///
    /// Any error of [`Engine::step`].
    pub fn step(&mut self) -> Result<Snapshot, SearchError> {
        let was_running = self.engine.status() == Status::Running;
        let snapshot = self.engine.step()?;
        if was_running {
            self.trace.record(snapshot.clone());
        }
        Ok(snapshot)
    }

    /// Steps until the search terminates, recording every intermediate snapshot.
    ///
    /// Snapshots produced before an error are kept in the trace, so a run interrupted by the
    /// step limit can be resumed without gaps.
    ///
    /// # Errors
    ///
    /// Any error of [`Engine::run_to_completion`], including the recoverable
    /// [`SearchError::StepLimitExceeded`].
    pub fn run_to_completion(&mut self, limit: usize) -> Result<Snapshot, SearchError> {
        let trace = &mut self.trace;
        self.engine
            .run_to_completion_with(limit, |snapshot| trace.record(snapshot.clone()))
    }

    /// Returns the engine to idle and forgets the recorded trace.
    pub fn reset(&mut self) {
        self.engine.reset();
        self.trace.clear();
        info!("session reset");
    }

    /// Forgets the recorded trace while keeping the engine as it is.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidState`] while the engine is still running, since the trace would
    ///   stop being a complete replay of the run.
    pub fn clear_trace(&mut self) -> Result<(), SearchError> {
        let status = self.engine.status();
        if status == Status::Running {
            return Err(SearchError::InvalidState {
                operation: "clear the trace",
                status,
            });
        }
        self.trace.clear();
        Ok(())
    }

    /// Engine driven by this session.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Trace recorded by this session.
    #[must_use]
    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Latest recorded snapshot.
    fn latest(&self) -> Result<&Snapshot, SearchError> {
        self.trace.latest().ok_or(SearchError::NotInitialized)
    }
}
