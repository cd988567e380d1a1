//! Step-driven A* search over weighted grids, with a recorder and a terminal viewer.
//!
//! The core is host independent:
//! - [`grid::Grid`] holds the cells and the movement policy.
//! - [`engine::Engine`] advances the search one expansion at a time and hands out
//!   [`engine::Snapshot`]s of its full state.
//! - [`trace::Trace`] records those snapshots for replay and export.
//! - [`session::Session`] ties an engine to its trace.
//!
//! On top of it sit the map format, the command-line configuration, a headless runner and a
//! ratatui viewer that can step, replay and animate a search.

#![expect(
    clippy::cargo_common_metadata,
    reason = "Temporary allow during development."
)]

pub mod config;
pub mod engine;
pub mod file_loader;
pub mod grid;
pub mod headless;
pub mod heuristic;
pub mod map;
pub mod session;
pub mod trace;
pub mod types;

mod animation;
mod app;
mod events;
mod ui;

pub use app::App;
pub use config::{init_logging, Args, Config};
