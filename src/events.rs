//! Event handling functions for user input and application state updates.

use std::time::Duration;

use color_eyre::eyre::Result;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind};
use tracing::trace;

use crate::App;

/// Longest time to block waiting for input before the playback gets a chance to advance.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Handles input events and updates the application state accordingly.
///
/// This function polls for keyboard events and dispatches them to [`handle_key`]. It uses a
/// timeout no longer than the playback delay to avoid blocking the animation.
pub(crate) fn handle_events(app: &mut App) -> Result<()> {
    if event::poll(POLL_TIMEOUT.min(app.playback.delay()))? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                handle_key(app, key.code)?;
            }
        }
    }

    app.tick()
}

/// Applies a single key press to the application.
///
/// | key       | action                                                   |
/// |-----------|----------------------------------------------------------|
/// | `q`       | quit                                                     |
/// | space     | play or pause                                            |
/// | `l`       | one entry forward, stepping the engine at the end        |
/// | `h`       | one entry back                                           |
/// | `g` / `G` | first / latest entry                                     |
/// | `c`       | run the search to completion                             |
/// | `r`       | restart the search                                       |
/// | `n`       | switch to the next map                                   |
pub(crate) fn handle_key(app: &mut App, code: KeyCode) -> Result<()> {
    trace!(?code, "key pressed");

    match code {
        KeyCode::Char('q') => app.exit = true,
        KeyCode::Char(' ') => app.playback.toggle(),
        KeyCode::Char('l') => app.step_forward()?,
        KeyCode::Char('h') => app.playback.seek_back(),
        KeyCode::Char('g') => app.playback.seek_first(),
        KeyCode::Char('G') => app.playback.seek_last(app.session.trace().len()),
        KeyCode::Char('c') => app.run_to_completion()?,
        KeyCode::Char('r') => app.restart()?,
        KeyCode::Char('n') => app.next_map()?,
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, map::Map, types::Status};

    /// App searching a small open map.
    fn create_test_app() -> App {
        let map = Map::new("room.gridmap".into(), "S..\n...\n..G").expect("map should parse");
        App::new(Config::default(), vec![map, Map::default()]).expect("app should start")
    }

    #[test]
    fn test_q_quits() {
        let mut app = create_test_app();

        handle_key(&mut app, KeyCode::Char('q')).expect("key should be handled");

        assert!(app.exit);
    }

    #[test]
    fn test_space_toggles_playback() {
        let mut app = create_test_app();

        handle_key(&mut app, KeyCode::Char(' ')).expect("key should be handled");
        assert!(app.playback.is_playing());
        handle_key(&mut app, KeyCode::Char(' ')).expect("key should be handled");
        assert!(!app.playback.is_playing());
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = create_test_app();

        for _ in 0..3 {
            handle_key(&mut app, KeyCode::Char('l')).expect("key should be handled");
        }
        assert_eq!(app.session.trace().len(), 4);
        assert_eq!(app.playback.cursor(), 3);

        handle_key(&mut app, KeyCode::Char('h')).expect("key should be handled");
        assert_eq!(app.playback.cursor(), 2);

        handle_key(&mut app, KeyCode::Char('g')).expect("key should be handled");
        assert_eq!(app.playback.cursor(), 0);

        handle_key(&mut app, KeyCode::Char('G')).expect("key should be handled");
        assert_eq!(app.playback.cursor(), 3);
    }

    #[test]
    fn test_complete_then_reset() {
        let mut app = create_test_app();

        handle_key(&mut app, KeyCode::Char('c')).expect("key should be handled");
        assert_eq!(app.session.engine().status(), Status::Succeeded);

        handle_key(&mut app, KeyCode::Char('r')).expect("key should be handled");
        assert_eq!(app.session.engine().status(), Status::Running);
        assert_eq!(app.session.trace().len(), 1);
        assert_eq!(app.playback.cursor(), 0);
    }

    #[test]
    fn test_n_switches_map() {
        let mut app = create_test_app();

        handle_key(&mut app, KeyCode::Char('n')).expect("key should be handled");

        assert_eq!(app.map_index, 1);
        assert_eq!(app.session.engine().start(), Some(Map::default().start));
    }

    #[test]
    fn test_unbound_keys_are_ignored() {
        let mut app = create_test_app();

        handle_key(&mut app, KeyCode::Char('z')).expect("key should be handled");
        handle_key(&mut app, KeyCode::Esc).expect("key should be handled");

        assert!(!app.exit);
        assert_eq!(app.session.trace().len(), 1);
    }
}
