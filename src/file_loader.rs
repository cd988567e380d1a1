//! File loading and validation utilities for grid map files, plus trace export.

use std::{fs, path::Path};

use color_eyre::eyre::{ensure, OptionExt as _, Result, WrapErr as _};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    map::{Map, MAP_EXTENSION},
    trace::Trace,
};

/// Loads every map the configuration asks for.
///
/// The first map is the `--map` file, or the built-in maze when none is given. The maps found in
/// `--maps-dir` follow in file-name order, without a second copy of the `--map` file.
///
/// # Errors
///
/// This function may return errors if the `--map` file or the `--maps-dir` directory cannot be
/// loaded.
pub fn load_maps(config: &Config) -> Result<Vec<Map>> {
    let mut maps = vec![match &config.map {
        Some(path) => load(path)?,
        None => Map::default(),
    }];
    if let Some(dir) = &config.maps_dir {
        fetch_files(dir, config.map.as_deref(), &mut maps)
            .wrap_err_with(|| format!("failed to scan map directory {}", dir.display()))?;
    }

    Ok(maps)
}

/// Writes `trace` as a JSON array of snapshots to `path`.
///
/// # Errors
///
/// This function may return errors if the trace cannot be serialised or the file cannot be
/// written.
pub fn save_trace(trace: &Trace, path: &Path) -> Result<()> {
    fs::write(path, trace.to_json()?)
        .wrap_err_with(|| format!("failed to write trace to {}", path.display()))?;
    info!(path = %path.display(), entries = trace.len(), "trace exported");

    Ok(())
}

/// Loads a single map file.
///
/// # Errors
///
/// This function may return errors if:
/// - The path has no file name or lacks the `.gridmap` extension
/// - The file cannot be read
/// - The contents are not a valid map (see [`Map::new`])
pub fn load(path: &Path) -> Result<Map> {
    let file_name = path
        .file_name()
        .ok_or_eyre("map path has no file name")?
        .to_owned();
    ensure!(
        file_name
            .to_str()
            .is_some_and(|name| name.ends_with(MAP_EXTENSION)),
        "{} is not a {MAP_EXTENSION} file",
        path.display()
    );

    let contents = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read map {}", path.display()))?;
    let map = Map::new(file_name, &contents)
        .wrap_err_with(|| format!("failed to parse map {}", path.display()))?;
    debug!(key = %map.key, width = map.grid.width(), height = map.grid.height(), "map loaded");

    Ok(map)
}

/// Scans a directory for .gridmap files and loads the valid ones.
///
/// This function searches for files with the .gridmap extension in `dir`, validates their format,
/// and appends them to `maps` sorted by file name. Files that cannot be read as text or fail
/// validation are skipped with a warning so a single broken file does not hide the others. The
/// file at `skip`, if it sits in `dir`, is left out.
///
/// # Errors
///
/// This function may return errors if the directory or one of its entries cannot be read.
pub fn fetch_files(dir: &Path, skip: Option<&Path>, maps: &mut Vec<Map>) -> Result<()> {
    let skip = skip.and_then(|path| fs::canonicalize(path).ok());

    let mut paths = Vec::new();
    for file in fs::read_dir(dir)? {
        let file = file?;
        let file_name = file.file_name();
        if file.file_type()?.is_dir() || !file_name.to_string_lossy().ends_with(MAP_EXTENSION) {
            continue;
        }
        if file_name.to_str().is_some() {
            paths.push(file.path());
        } else {
            warn!(name = ?file_name, "skipping map file with a non UTF-8 name");
        }
    }
    paths.sort();

    for path in paths {
        if skip.is_some() && fs::canonicalize(&path).ok() == skip {
            debug!(path = %path.display(), "map already loaded");
            continue;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) => {
                warn!(path = %path.display(), %err, "skipping unreadable map file");
                continue;
            }
        };
        if !parse_file_contents(contents.trim()) {
            warn!(path = %path.display(), "skipping malformed map file");
            continue;
        }

        let file_name = path
            .file_name()
            .ok_or_eyre("directory entry has no file name")?
            .to_owned();
        match Map::new(file_name, &contents) {
            Ok(map) => maps.push(map),
            Err(err) => warn!(path = %path.display(), %err, "skipping malformed map file"),
        }
    }

    Ok(())
}

/// Validates the format and content of grid map files.
///
/// This function performs validation to ensure the map format follows the specification:
/// - Contains only valid symbols (`#`, `.`, `2`-`9`, `S`, `G`)
/// - Has consistent, non-zero row lengths
/// - Has exactly one start (`S`) and exactly one goal (`G`)
pub fn parse_file_contents(input: &str) -> bool {
    let lines: Vec<&str> = input.lines().map(str::trim_end).collect();

    let Some(first_line) = lines.first() else {
        return false;
    };
    let expected_width = first_line.chars().count();
    if expected_width == 0 {
        return false;
    }

    let mut starts = 0;
    let mut goals = 0;

    for line in &lines {
        // Check consistent row lengths
        if line.chars().count() != expected_width {
            return false;
        }

        for symbol in line.chars() {
            match symbol {
                'S' => starts += 1,
                'G' => goals += 1,
                '#' | '.' | '2'..='9' => {}
                _ => return false,
            }
        }
    }

    starts == 1 && goals == 1
}
