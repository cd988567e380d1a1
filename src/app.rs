//! Core application state and logic for the search viewer.

use color_eyre::eyre::{ensure, OptionExt as _, Result};
use ratatui::DefaultTerminal;
use tracing::{debug, info, warn};

use crate::{
    animation::{Advance, Playback},
    config::Config,
    events, file_loader,
    map::Map,
    session::Session,
    types::{SearchError, Status},
    ui,
};

/// Application state container for the search viewer.
///
/// This structure holds the state of the application, which is to say the structure from which
/// Ratatui will render the search and Crossterm events will help writing to.
pub struct App {
    /// Application exit flag.
    ///
    /// This field indicates whether the application should exit. It is set to `true` when the user
    /// wants to quit but it starts off `false`.
    pub(crate) exit: bool,
    /// Settings the search is run with.
    pub(crate) config: Config,
    /// Maps the user can cycle through. Never empty.
    pub(crate) maps: Vec<Map>,
    /// Index of the map being searched.
    pub(crate) map_index: usize,
    /// Engine and recorded trace of the current search.
    pub(crate) session: Session,
    /// Cursor into the recorded trace.
    pub(crate) playback: Playback,
    /// Notice shown in the status bar until the next restart.
    pub(crate) message: Option<String>,
}

impl App {
    /// Creates the viewer and starts a search on the first map.
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - `maps` is empty
    /// - The first map has no valid endpoints for the search
    pub fn new(config: Config, maps: Vec<Map>) -> Result<Self> {
        ensure!(!maps.is_empty(), "no map to search");

        let mut app = Self {
            exit: false,
            playback: Playback::new(config.delay),
            config,
            maps,
            map_index: 0,
            session: Session::new(),
            message: None,
        };
        app.restart()?;

        Ok(app)
    }

    /// Runs the main loop of the application.
    ///
    /// This function handles user input and updates the application state. The loop continues until
    /// the exit condition is `true`. The recorded trace is then exported if an export path is
    /// configured.
    ///
    /// # Errors
    ///
    /// - [`std::io::Error`]
    /// - Any error raised while stepping the search or exporting the trace
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        while !self.exit {
            let _ = terminal.try_draw(|frame| {
                ui::draw(self, frame).map_err(std::io::Error::other)
            })?;
            events::handle_events(self)?;
        }

        if let Some(path) = &self.config.export {
            file_loader::save_trace(self.session.trace(), path)?;
        }

        Ok(())
    }

    /// Map being searched.
    pub(crate) fn map(&self) -> Result<&Map> {
        self.maps
            .get(self.map_index)
            .ok_or_eyre("failed to retrieve the selected map")
    }

    /// Discards the current search and starts a fresh one on the selected map.
    pub(crate) fn restart(&mut self) -> Result<()> {
        let map = self
            .maps
            .get(self.map_index)
            .ok_or_eyre("failed to retrieve the selected map")?;
        let grid = map.grid.clone().with_neighborhood(self.config.neighborhood);

        self.session.reset();
        let _ = self
            .session
            .start(grid, map.start, map.goal, self.config.heuristic())?;
        self.playback.pause();
        self.playback.seek_first();
        self.message = None;
        info!(map = %map.key, start = %map.start, goal = %map.goal, "search started");

        Ok(())
    }

    /// Switches to the next map, wrapping around, and restarts the search.
    pub(crate) fn next_map(&mut self) -> Result<()> {
        self.map_index = (self.map_index + 1) % self.maps.len();
        self.restart()
    }

    /// Moves the cursor forward, or asks the engine for a new step when it is on the latest entry.
    pub(crate) fn step_forward(&mut self) -> Result<()> {
        if !self.playback.seek_forward(self.session.trace().len()) {
            self.advance_engine()?;
        }

        Ok(())
    }

    /// Runs the search until it terminates or the step limit is reached, then shows the latest
    /// entry.
    pub(crate) fn run_to_completion(&mut self) -> Result<()> {
        let outcome = self
            .session
            .run_to_completion(self.config.step_limit)
            .map(|snapshot| snapshot.status);

        match outcome {
            Ok(status) => debug!(%status, "search ran to completion"),
            Err(err @ SearchError::StepLimitExceeded { .. }) => {
                warn!(%err, "run to completion interrupted");
                self.message = Some(format!("{err}, press (c) to continue"));
            }
            Err(err) => return Err(err.into()),
        }
        self.playback.pause();
        self.playback.seek_last(self.session.trace().len());

        Ok(())
    }

    /// Advances automatic playback by one frame when it is due.
    pub(crate) fn tick(&mut self) -> Result<()> {
        let running = self.session.engine().status() == Status::Running;
        match self.playback.update(self.session.trace().len(), running) {
            Advance::NeedStep => self.advance_engine()?,
            Advance::Finished => debug!("playback reached the end of the search"),
            Advance::Wait | Advance::Moved => {}
        }

        Ok(())
    }

    /// Takes one engine step and moves the cursor onto it. Does nothing once the search is over.
    fn advance_engine(&mut self) -> Result<()> {
        if self.session.engine().status() == Status::Running {
            let _ = self.session.step()?;
            self.playback.seek_last(self.session.trace().len());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Map whose search takes a handful of steps.
    fn corridor() -> Map {
        Map::new("corridor.gridmap".into(), "S...G").expect("map should parse")
    }

    /// App searching the corridor map.
    fn create_test_app() -> App {
        App::new(Config::default(), vec![corridor()]).expect("app should start")
    }

    #[test]
    fn test_new_app_starts_search() {
        let app = create_test_app();

        assert!(!app.exit);
        assert_eq!(app.session.engine().status(), Status::Running);
        assert_eq!(app.session.trace().len(), 1);
        assert_eq!(app.playback.cursor(), 0);
    }

    #[test]
    fn test_new_app_without_maps_fails() {
        assert!(App::new(Config::default(), Vec::new()).is_err());
    }

    #[test]
    fn test_step_forward_extends_trace_then_replays() {
        let mut app = create_test_app();

        app.step_forward().expect("step should succeed");
        app.step_forward().expect("step should succeed");
        assert_eq!(app.session.trace().len(), 3);
        assert_eq!(app.playback.cursor(), 2);

        app.playback.seek_first();
        app.step_forward().expect("step should succeed");
        assert_eq!(app.session.trace().len(), 3, "replaying must not step the engine");
        assert_eq!(app.playback.cursor(), 1);
    }

    #[test]
    fn test_run_to_completion_shows_final_state() {
        let mut app = create_test_app();

        app.run_to_completion().expect("search should finish");

        assert_eq!(app.session.engine().status(), Status::Succeeded);
        assert_eq!(app.playback.cursor() + 1, app.session.trace().len());
        assert!(app.message.is_none());
    }

    #[test]
    fn test_step_limit_leaves_notice() {
        let config = Config {
            step_limit: 1,
            ..Config::default()
        };
        let mut app = App::new(config, vec![corridor()]).expect("app should start");

        app.run_to_completion().expect("step limit is not fatal");

        assert_eq!(app.session.engine().status(), Status::Running);
        assert!(app.message.is_some());

        app.restart().expect("restart should succeed");
        assert!(app.message.is_none());
    }

    #[test]
    fn test_tick_steps_engine_while_playing() {
        let config = Config {
            delay: Duration::ZERO,
            ..Config::default()
        };
        let mut app = App::new(config, vec![corridor()]).expect("app should start");
        app.playback.toggle();

        for _ in 0..20 {
            app.tick().expect("tick should succeed");
        }

        assert_eq!(app.session.engine().status(), Status::Succeeded);
        assert!(!app.playback.is_playing());
        assert_eq!(app.playback.cursor() + 1, app.session.trace().len());
    }

    #[test]
    fn test_next_map_wraps_around() {
        let mut app =
            App::new(Config::default(), vec![corridor(), Map::default()]).expect("app should start");
        app.step_forward().expect("step should succeed");

        app.next_map().expect("next map should start");
        assert_eq!(app.map().map(|map| map.key.as_str()).ok(), Some("Default"));
        assert_eq!(app.session.trace().len(), 1);

        app.next_map().expect("next map should start");
        assert_eq!(app.map().map(|map| map.key.as_str()).ok(), Some("corridor"));
    }
}
