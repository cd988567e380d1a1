//! User interface rendering for the search viewer.

use std::collections::BTreeSet;

use color_eyre::eyre::{OptionExt as _, Result};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::Line,
    widgets::{
        canvas::{Canvas, Points},
        Block, BorderType, Borders, Clear, Paragraph,
    },
    Frame,
};

use crate::{animation, engine::Snapshot, grid::Grid, types::Coord, App};

/// Visual class of a single cell.
///
/// When a cell belongs to several classes the earlier variant wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Paint {
    /// Start cell.
    Start,
    /// Goal cell.
    Goal,
    /// Cell on the reconstructed path.
    Path,
    /// Cell expanded by the latest step.
    Current,
    /// Cell waiting in the open set.
    Frontier,
    /// Cell in the closed set.
    Visited,
    /// Blocked cell.
    Wall,
    /// Untouched open cell.
    Open,
}

impl Paint {
    /// Every class in drawing order.
    const ALL: [Self; 8] = [
        Self::Start,
        Self::Goal,
        Self::Path,
        Self::Current,
        Self::Frontier,
        Self::Visited,
        Self::Wall,
        Self::Open,
    ];

    /// Color the class is drawn with, if it is drawn at all.
    const fn color(self) -> Option<Color> {
        match self {
            Self::Start => Some(Color::Cyan),
            Self::Goal => Some(Color::LightMagenta),
            Self::Path => Some(Color::Red),
            Self::Current => Some(Color::White),
            Self::Frontier => Some(Color::Yellow),
            Self::Visited => Some(Color::Blue),
            Self::Wall => Some(Color::Green),
            Self::Open => None,
        }
    }
}

/// Everything needed to draw one search state.
///
/// Drawing only reads the grid and the snapshot, so two equal snapshots of the same grid always
/// produce the same picture.
pub(crate) struct View<'state> {
    /// Searched grid.
    grid: &'state Grid,
    /// Start of the search.
    start: Coord,
    /// Goal of the search.
    goal: Coord,
    /// Snapshot being shown.
    snapshot: &'state Snapshot,
    /// Open set of the snapshot, for membership tests.
    open: BTreeSet<Coord>,
    /// Closed set of the snapshot, for membership tests.
    closed: BTreeSet<Coord>,
    /// Path of the snapshot, for membership tests.
    path: BTreeSet<Coord>,
}

impl<'state> View<'state> {
    /// Prepares `snapshot` of a search from `start` to `goal` on `grid` for drawing.
    pub(crate) fn new(
        grid: &'state Grid,
        start: Coord,
        goal: Coord,
        snapshot: &'state Snapshot,
    ) -> Self {
        Self {
            grid,
            start,
            goal,
            snapshot,
            open: snapshot.open.iter().copied().collect(),
            closed: snapshot.closed.iter().copied().collect(),
            path: snapshot.path.iter().copied().collect(),
        }
    }

    /// Visual class of the cell at `coord`.
    pub(crate) fn paint(&self, coord: Coord) -> Paint {
        if coord == self.start {
            Paint::Start
        } else if coord == self.goal {
            Paint::Goal
        } else if self.path.contains(&coord) {
            Paint::Path
        } else if self.snapshot.current == Some(coord) {
            Paint::Current
        } else if self.open.contains(&coord) {
            Paint::Frontier
        } else if self.closed.contains(&coord) {
            Paint::Visited
        } else if self.grid.is_blocked(coord) {
            Paint::Wall
        } else {
            Paint::Open
        }
    }

    /// Canvas coordinates of every cell, grouped by visual class.
    fn layers(&self) -> Result<Vec<(Color, Vec<(f64, f64)>)>> {
        let mut groups: Vec<(Paint, Vec<Coord>)> =
            Paint::ALL.iter().map(|paint| (*paint, Vec::new())).collect();
        for coord in self.grid.coords() {
            let paint = self.paint(coord);
            if let Some((_, coords)) = groups.iter_mut().find(|(class, _)| *class == paint) {
                coords.push(coord);
            }
        }

        let mut layers = Vec::new();
        for (paint, coords) in groups {
            if let Some(color) = paint.color() {
                layers.push((
                    color,
                    animation::transform_grid_to_screen_coords(&coords, self.grid)?,
                ));
            }
        }

        Ok(layers)
    }
}

/// Draws the whole viewer: the grid of the selected trace entry plus the status bar.
///
/// # Errors
///
/// This function may return errors if:
/// - The playback cursor points outside the trace
/// - The grid does not fit the terminal coordinate range
pub(crate) fn draw(app: &App, frame: &mut Frame) -> Result<()> {
    clear(frame);

    let map = app.map()?;
    let snapshot = app.session.trace().at(app.playback.cursor())?;
    let grid = app
        .session
        .engine()
        .grid()
        .ok_or_eyre("failed to retrieve the searched grid")?;

    let [search_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(4)]).areas(frame.area());

    draw_search(frame, search_area, &View::new(grid, map.start, map.goal, snapshot))?;
    draw_status(app, frame, status_area, snapshot)?;

    Ok(())
}

/// Clears the whole frame.
pub(crate) fn clear(frame: &mut Frame) {
    let clear = Clear;
    frame.render_widget(clear, frame.area());
}

/// Draws one search state centered in `area`, one terminal cell per grid cell.
///
/// # Errors
///
/// This function may return errors if the grid does not fit the terminal coordinate range.
pub(crate) fn draw_search(frame: &mut Frame, area: Rect, view: &View<'_>) -> Result<()> {
    let [_, rows, _] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(view.grid.height())?),
        Constraint::Min(1),
    ])
    .areas(area);
    let [_, space, _] = Layout::horizontal([
        Constraint::Min(1),
        Constraint::Length(u16::try_from(view.grid.width())?),
        Constraint::Min(1),
    ])
    .areas(rows);

    // Pre-compute screen coordinates to handle errors before the paint closure
    let layers = view.layers()?;

    let canvas = Canvas::default()
        .x_bounds([
            (-rounded_div::i32(space.width.into(), 2)).into(),
            (rounded_div::i32(space.width.into(), 2)).into(),
        ])
        .y_bounds([
            (-rounded_div::i32(space.height.into(), 2)).into(),
            (rounded_div::i32(space.height.into(), 2)).into(),
        ])
        .marker(Marker::Dot)
        .paint(|ctx| {
            for (color, coords) in &layers {
                ctx.draw(&Points {
                    coords,
                    color: *color,
                });
            }
        });

    frame.render_widget(canvas, space);

    Ok(())
}

/// Draws the status bar with the counters of `snapshot` and the key bindings.
fn draw_status(app: &App, frame: &mut Frame, area: Rect, snapshot: &Snapshot) -> Result<()> {
    let map = app.map()?;
    let cost = snapshot
        .path_cost()
        .map_or_else(|| "-".to_owned(), |cost| format!("{cost:.2}"));
    let playing = if app.playback.is_playing() {
        "playing"
    } else {
        "paused"
    };

    let counters = Line::raw(format!(
        "{} | step {} | frame {}/{} | {} ({playing}) | open {} | closed {} | path {} | cost {cost}",
        map.key,
        snapshot.step,
        app.playback.cursor() + 1,
        app.session.trace().len(),
        snapshot.status,
        snapshot.open.len(),
        snapshot.closed.len(),
        snapshot.path.len(),
    ));
    let detail = app.message.as_ref().map_or_else(
        || {
            Line::raw(format!(
                "{} x{} | {} neighbourhood",
                app.config.distance.name(),
                app.config.weight,
                app.config.neighborhood.name(),
            ))
        },
        |message| Line::styled(message.as_str(), Style::default().fg(Color::Yellow)),
    );

    let block = Block::bordered()
        .title_bottom(
            "(space) play / (h) back / (l) forward / (g) first / (G) last / (c) complete / (r) reset / (n) next map / (q) quit",
        )
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(Color::Green))
        .border_type(BorderType::Plain)
        .borders(Borders::TOP | Borders::BOTTOM);

    frame.render_widget(
        Paragraph::new(vec![counters.centered(), detail.centered()]).block(block),
        area,
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config, engine::Engine, heuristic::Distance, map::Map, session::Session,
        types::Neighborhood,
    };
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};

    /// Creates a test terminal with known dimensions for UI testing.
    fn create_test_terminal() -> Terminal<TestBackend> {
        let backend = TestBackend::new(80, 24);
        Terminal::new(backend).expect("failed to create test terminal")
    }

    /// Creates a minimal test app for UI testing.
    fn create_test_app() -> App {
        App::new(Config::default(), vec![Map::default()]).expect("app should start")
    }

    /// Renders one search state on a fresh test terminal and returns the buffer.
    fn render(grid: &Grid, start: Coord, goal: Coord, snapshot: &Snapshot) -> Buffer {
        let mut terminal = create_test_terminal();
        let _ = terminal
            .draw(|frame| {
                draw_search(
                    frame,
                    frame.area(),
                    &View::new(grid, start, goal, snapshot),
                )
                .expect("drawing should succeed in test");
            })
            .expect("drawing should succeed in test");
        terminal.backend().buffer().clone()
    }

    #[test]
    fn test_paint_precedence() {
        let grid = Grid::build(4, 1, [Coord::new(0, 3)], []).expect("grid should build");
        let snapshot = Snapshot {
            current: Some(Coord::new(0, 1)),
            open: vec![Coord::new(0, 1), Coord::new(0, 2)],
            closed: vec![Coord::new(0, 0), Coord::new(0, 1), Coord::new(0, 2)],
            path: vec![Coord::new(0, 2)],
            ..Snapshot::default()
        };
        let view = View::new(&grid, Coord::new(0, 0), Coord::new(0, 3), &snapshot);

        assert_eq!(view.paint(Coord::new(0, 0)), Paint::Start);
        assert_eq!(view.paint(Coord::new(0, 1)), Paint::Current);
        assert_eq!(view.paint(Coord::new(0, 2)), Paint::Path);
        assert_eq!(view.paint(Coord::new(0, 3)), Paint::Goal);
    }

    #[test]
    fn test_paint_plain_cells() {
        let grid = Grid::build(3, 2, [Coord::new(1, 1)], []).expect("grid should build");
        let snapshot = Snapshot {
            open: vec![Coord::new(1, 0)],
            closed: vec![Coord::new(0, 1)],
            ..Snapshot::default()
        };
        let view = View::new(&grid, Coord::new(0, 0), Coord::new(0, 2), &snapshot);

        assert_eq!(view.paint(Coord::new(1, 0)), Paint::Frontier);
        assert_eq!(view.paint(Coord::new(0, 1)), Paint::Visited);
        assert_eq!(view.paint(Coord::new(1, 1)), Paint::Wall);
        assert_eq!(view.paint(Coord::new(1, 2)), Paint::Open);
    }

    #[test]
    fn test_draw_viewer() {
        let app = create_test_app();
        let mut terminal = create_test_terminal();

        let result = terminal.draw(|frame| {
            draw(&app, frame).expect("drawing should succeed in test");
        });

        assert!(result.is_ok(), "drawing the viewer should succeed");
    }

    #[test]
    fn test_status_bar_shows_counters() {
        let mut app = create_test_app();
        app.run_to_completion().expect("search should finish");
        let mut terminal = create_test_terminal();

        let _ = terminal
            .draw(|frame| {
                draw(&app, frame).expect("drawing should succeed in test");
            })
            .expect("drawing should succeed in test");

        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Default"), "status bar should name the map");
        assert!(text.contains("succeeded"), "status bar should show the status");
    }

    #[test]
    fn test_clear_function() {
        let mut terminal = create_test_terminal();

        let result = terminal.draw(|frame| {
            clear(frame);
        });

        assert!(result.is_ok(), "clearing screen should succeed");
    }

    #[test]
    fn test_replayed_final_state_renders_like_live_run() {
        let map = Map::default();
        let grid = map.grid.clone().with_neighborhood(Neighborhood::Eight);

        let mut session = Session::new();
        let _ = session
            .start(grid.clone(), map.start, map.goal, Distance::Octile)
            .expect("endpoints should be valid");
        let _ = session.run_to_completion(10_000).expect("search should finish");
        let replayed = session
            .trace()
            .latest()
            .cloned()
            .expect("trace should not be empty");

        let mut engine = Engine::new();
        let _ = engine
            .initialize(grid.clone(), map.start, map.goal, Distance::Octile)
            .expect("endpoints should be valid");
        let live = engine.run_to_completion(10_000).expect("search should finish");

        assert_eq!(
            render(&grid, map.start, map.goal, &replayed),
            render(&grid, map.start, map.goal, &live)
        );
    }

    #[test]
    fn test_every_recorded_state_renders_like_its_live_counterpart() {
        let map = Map::default();
        let mut session = Session::new();
        let _ = session
            .start(map.grid.clone(), map.start, map.goal, Distance::Manhattan)
            .expect("endpoints should be valid");
        let mut engine = Engine::new();
        let _ = engine
            .initialize(map.grid.clone(), map.start, map.goal, Distance::Manhattan)
            .expect("endpoints should be valid");

        for _ in 0..20 {
            let live = engine.step().expect("step should succeed");
            let recorded = session.step().expect("step should succeed");

            assert_eq!(
                render(&map.grid, map.start, map.goal, &recorded),
                render(&map.grid, map.start, map.goal, &live)
            );
        }
    }
}
