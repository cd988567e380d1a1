//! Command-line arguments, resolved run settings and logging setup.

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use clap::Parser;
use color_eyre::eyre::{ensure, eyre, Result, WrapErr as _};
use tracing_subscriber::EnvFilter;

use crate::{
    heuristic::{Distance, Weighted},
    types::Neighborhood,
};

/// Default number of engine steps a single run-to-completion may take.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// Default delay between two frames of the animated playback, in milliseconds.
///
/// A lower value results in faster playback, while a higher value slows it down to make the
/// algorithm's progress easier to follow.
pub const DEFAULT_DELAY_MS: u64 = 200;

/// Log filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "info";

/// Step through an A* search on a grid map in the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Map file to search (`.gridmap`). Defaults to the built-in maze.
    #[arg(long, value_name = "FILE")]
    pub map: Option<PathBuf>,

    /// Directory of additional `.gridmap` files to cycle through with `n`.
    #[arg(long, value_name = "DIR")]
    pub maps_dir: Option<PathBuf>,

    /// Movement policy.
    #[arg(long, value_enum, default_value_t = Neighborhood::Four)]
    pub neighborhood: Neighborhood,

    /// Distance estimate. Defaults to the tightest metric for the movement policy.
    #[arg(long, value_enum)]
    pub heuristic: Option<Distance>,

    /// Factor applied to every heuristic estimate. Values above 1 trade optimality for speed.
    #[arg(long, default_value_t = 1.)]
    pub weight: f64,

    /// Maximum number of steps a run to completion may take.
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    pub step_limit: usize,

    /// Delay between playback frames, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    /// Run the search to completion without the terminal UI and print a summary.
    #[arg(long)]
    pub headless: bool,

    /// Write the recorded trace as JSON to this file.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Write log output to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Validated settings for one program run.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Map file to search, if any.
    pub map: Option<PathBuf>,
    /// Directory of additional maps, if any.
    pub maps_dir: Option<PathBuf>,
    /// Movement policy applied to every loaded map.
    pub neighborhood: Neighborhood,
    /// Distance estimate.
    pub distance: Distance,
    /// Factor applied to the distance estimate.
    pub weight: f64,
    /// Maximum number of steps a run to completion may take.
    pub step_limit: usize,
    /// Delay between playback frames.
    pub delay: Duration,
    /// Whether to skip the terminal UI.
    pub headless: bool,
    /// Destination of the JSON trace export.
    pub export: Option<PathBuf>,
    /// Destination of the log output.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: None,
            maps_dir: None,
            neighborhood: Neighborhood::Four,
            distance: Distance::default_for(Neighborhood::Four),
            weight: 1.,
            step_limit: DEFAULT_STEP_LIMIT,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            headless: false,
            export: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Resolves defaults and validates the parsed command line.
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - The weight is not a finite number greater than zero
    /// - The step limit or the playback delay is zero
    pub fn from_args(args: Args) -> Result<Self> {
        ensure!(
            args.weight.is_finite() && args.weight > 0.,
            "heuristic weight must be a finite number above zero, got {}",
            args.weight
        );
        ensure!(args.step_limit > 0, "step limit must be at least 1");
        ensure!(args.delay_ms > 0, "playback delay must be at least 1 ms");

        Ok(Self {
            map: args.map,
            maps_dir: args.maps_dir,
            neighborhood: args.neighborhood,
            distance: args
                .heuristic
                .unwrap_or_else(|| Distance::default_for(args.neighborhood)),
            weight: args.weight,
            step_limit: args.step_limit,
            delay: Duration::from_millis(args.delay_ms),
            headless: args.headless,
            export: args.export,
            log_file: args.log_file,
        })
    }

    /// Heuristic to hand to the engine.
    #[must_use]
    pub const fn heuristic(&self) -> Weighted<Distance> {
        Weighted::new(self.distance, self.weight)
    }
}

/// Installs the global `tracing` subscriber.
///
/// The filter is read from `RUST_LOG` and falls back to `info`. Output goes to the configured log
/// file. Without one, headless runs log to stderr and the terminal UI logs nowhere, since it owns
/// the screen.
///
/// # Errors
///
/// This function may return errors if:
/// - The log file cannot be created
/// - A global subscriber has already been installed
pub fn init_logging(config: &Config) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|err| eyre!("failed to install the log subscriber: {err}"))?;
    } else if config.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init()
            .map_err(|err| eyre!("failed to install the log subscriber: {err}"))?;
    }

    Ok(())
}
