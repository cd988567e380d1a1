//! Playback cursor and coordinate transformation for the search visualization.
//!
//! The viewer never draws the engine directly. It draws the trace entry under the [`Playback`]
//! cursor, so stepping back and forth through a recorded run and watching it live go through the
//! same code.

use std::time::{Duration, Instant};

use color_eyre::eyre::Result;

use crate::{grid::Grid, types::Coord};

/// Outcome of a playback tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Advance {
    /// Nothing to do yet, either because playback is paused or the delay has not elapsed.
    Wait,
    /// The cursor moved one entry forward.
    Moved,
    /// The cursor is on the latest entry and the engine should produce another one.
    NeedStep,
    /// The cursor is on the latest entry of a finished search. Playback paused itself.
    Finished,
}

/// Cursor into the recorded trace, with timing for the animated playback.
#[derive(Clone, Debug)]
pub(crate) struct Playback {
    /// Index of the trace entry being displayed.
    cursor: usize,
    /// Whether the cursor advances on its own.
    playing: bool,
    /// Time between two automatic advances.
    delay: Duration,
    /// Time of the last automatic advance.
    last_update_time: Instant,
}

impl Playback {
    /// Creates a paused cursor on the first entry.
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            cursor: 0,
            playing: false,
            delay,
            last_update_time: Instant::now(),
        }
    }

    /// Index of the trace entry being displayed.
    pub(crate) const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the cursor advances on its own.
    pub(crate) const fn is_playing(&self) -> bool {
        self.playing
    }

    /// Time between two automatic advances.
    pub(crate) const fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts or pauses playback.
    pub(crate) fn toggle(&mut self) {
        self.playing = !self.playing;
        self.last_update_time = Instant::now();
    }

    /// Stops automatic advances.
    pub(crate) const fn pause(&mut self) {
        self.playing = false;
    }

    /// Moves the cursor one entry forward within a trace of `len` entries.
    ///
    /// Returns whether the cursor moved.
    pub(crate) const fn seek_forward(&mut self, len: usize) -> bool {
        if self.cursor + 1 < len {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Moves the cursor one entry back.
    pub(crate) const fn seek_back(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor to the first entry.
    pub(crate) const fn seek_first(&mut self) {
        self.cursor = 0;
    }

    /// Moves the cursor to the latest of `len` entries.
    pub(crate) const fn seek_last(&mut self, len: usize) {
        self.cursor = len.saturating_sub(1);
    }

    /// Advances the cursor if playing and the frame delay has elapsed.
    ///
    /// `len` is the number of recorded entries and `running` tells whether the engine can still
    /// produce more.
    pub(crate) fn update(&mut self, len: usize, running: bool) -> Advance {
        if !self.playing || self.last_update_time.elapsed() < self.delay {
            return Advance::Wait;
        }
        self.last_update_time = Instant::now();

        if self.seek_forward(len) {
            Advance::Moved
        } else if running {
            Advance::NeedStep
        } else {
            self.playing = false;
            Advance::Finished
        }
    }
}

/// Transforms grid coordinates to canvas coordinates centered on the origin.
///
/// Rows grow downwards on the grid but upwards on the canvas, so row `i` of `n` maps to
/// `(n - 1) / 2 - i` while column `i` of `n` maps to `i - (n - 1) / 2`.
///
/// # Errors
///
/// This function may return errors if the grid or a coordinate exceeds `u16::MAX`.
pub(crate) fn transform_grid_to_screen_coords(
    coords: &[Coord],
    grid: &Grid,
) -> Result<Vec<(f64, f64)>> {
    let rows_n = f64::from(u16::try_from(grid.height())?);
    let cols_n = f64::from(u16::try_from(grid.width())?);

    coords
        .iter()
        .map(|coord| {
            let screen_y = (rows_n - 1.) / 2. - f64::from(u16::try_from(coord.row)?);
            let screen_x = f64::from(u16::try_from(coord.col)?) - (cols_n - 1.) / 2.;

            Ok((screen_x, screen_y))
        })
        .collect()
}
