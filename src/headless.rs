//! Non-interactive search runs for scripts and terminals without a UI.

use std::fmt;

use color_eyre::eyre::Result;
use tracing::info;

use crate::{
    config::Config,
    file_loader,
    map::Map,
    session::Session,
    types::{Coord, Status},
};

/// Outcome of a headless run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Display key of the searched map.
    pub map: String,
    /// Terminal status of the search.
    pub status: Status,
    /// Number of expansions performed.
    pub steps: usize,
    /// Number of recorded snapshots.
    pub trace_len: usize,
    /// Path from start to goal, empty when the search failed.
    pub path: Vec<Coord>,
    /// Accumulated cost of the path.
    pub cost: Option<f64>,
}

impl fmt::Display for Summary {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}: {} after {} steps ({} snapshots)",
            self.map, self.status, self.steps, self.trace_len
        )?;
        if let Some(cost) = self.cost {
            write!(
                formatter,
                ", path of {} moves costing {cost:.2}",
                self.path.len().saturating_sub(1)
            )?;
        }
        Ok(())
    }
}

/// Runs the search on `map` to completion and exports the trace if configured.
///
/// # Errors
///
/// This function may return errors if:
/// - The map endpoints are rejected by the engine
/// - The search is still running after the configured step limit
/// - The trace cannot be exported
pub fn run(config: &Config, map: &Map) -> Result<Summary> {
    let grid = map.grid.clone().with_neighborhood(config.neighborhood);
    let mut session = Session::new();
    let _ = session.start(grid, map.start, map.goal, config.heuristic())?;
    let outcome = session.run_to_completion(config.step_limit);

    // Keep the partial trace when the step limit interrupts the run
    if let Some(path) = &config.export {
        file_loader::save_trace(session.trace(), path)?;
    }
    let last = outcome?;

    let summary = Summary {
        map: map.key.clone(),
        status: last.status,
        steps: last.step,
        trace_len: session.trace().len(),
        cost: last.path_cost(),
        path: last.path,
    };
    info!(%summary, "headless run finished");

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::{env, fs, process};

    use super::*;
    use crate::{heuristic::Distance, types::Neighborhood};

    #[test]
    fn test_run_solves_default_map() {
        let summary = run(&Config::default(), &Map::default()).expect("search should finish");

        assert_eq!(summary.status, Status::Succeeded);
        assert_eq!(summary.trace_len, summary.steps + 1);
        assert_eq!(summary.path.first(), Some(&Map::default().start));
        assert_eq!(summary.path.last(), Some(&Map::default().goal));
        assert!(summary.to_string().starts_with("Default: succeeded"));
    }

    #[test]
    fn test_run_reports_failure_as_status() {
        let map = Map::new("sealed.gridmap".into(), "S#G").expect("map should parse");

        let summary = run(&Config::default(), &map).expect("failure is not an error");

        assert_eq!(summary.status, Status::Failed);
        assert!(summary.path.is_empty());
        assert_eq!(summary.cost, None);
        assert_eq!(summary.to_string(), "sealed: failed after 2 steps (3 snapshots)");
    }

    #[test]
    fn test_run_respects_step_limit_and_exports_partial_trace() {
        let path = env::temp_dir().join(format!("astar-viewer-{}-partial.json", process::id()));
        let config = Config {
            step_limit: 2,
            export: Some(path.clone()),
            ..Config::default()
        };

        assert!(run(&config, &Map::default()).is_err());

        let exported = fs::read_to_string(&path).expect("partial trace should be exported");
        let states: Vec<crate::engine::Snapshot> =
            serde_json::from_str(&exported).expect("export should be valid json");
        assert_eq!(states.len(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_diagonal_moves_shorten_the_path() {
        let four = run(&Config::default(), &Map::default()).expect("search should finish");
        let eight = run(
            &Config {
                neighborhood: Neighborhood::Eight,
                distance: Distance::Octile,
                ..Config::default()
            },
            &Map::default(),
        )
        .expect("search should finish");

        assert!(eight.path.len() <= four.path.len());
    }
}
