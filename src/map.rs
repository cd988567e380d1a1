//! Text map format and the built-in default map.
//!
//! This module contains the [`Map`] struct, which turns a plain-text grid description into a
//! [`Grid`] plus the start and goal of the search. Every row of the text is one grid row:
//!
//! - `#` blocked cell
//! - `.` open cell with cost 1
//! - `2` to `9` open cell with that cost
//! - `S` start, `G` goal (both open with cost 1)

use std::{ffi::OsString, sync::LazyLock};

use color_eyre::eyre::{bail, ensure, OptionExt as _, Result};

use crate::{grid::Grid, types::Coord};

/// File extension of map files.
pub const MAP_EXTENSION: &str = ".gridmap";

/// Symbol of a blocked cell.
const WALL: char = '#';
/// Symbol of an open cell with unit cost.
const OPEN: char = '.';
/// Symbol of the start cell.
const START: char = 'S';
/// Symbol of the goal cell.
const GOAL: char = 'G';

/// Parsed search scenario.
///
/// A map couples the grid with the endpoints the search runs between and a display name taken
/// from the file it was loaded from.
#[derive(Clone, Debug, PartialEq)]
pub struct Map {
    /// Display name of the map.
    ///
    /// This field holds the file name the map was read from, without the extension.
    pub key: String,
    /// Grid described by the map, with the default four-neighbour policy.
    pub grid: Grid,
    /// Cell marked `S`.
    pub start: Coord,
    /// Cell marked `G`.
    pub goal: Coord,
}

impl Default for Map {
    fn default() -> Self {
        Self::new("Default.gridmap".into(), *DEFAULT_MAP).expect("failed to create default map")
    }
}

impl Map {
    /// Builds a map from a file name and its multiline content.
    ///
    /// Leading and trailing blank lines are ignored, and so is trailing whitespace on each row.
    ///
    /// # Errors
    ///
    /// This function may return errors if:
    /// - The `OsString` cannot be converted to a string slice
    /// - The file name doesn't end in the `.gridmap` extension
    /// - The rows are missing, of unequal length or contain unknown symbols
    /// - There is not exactly one start and one goal
    pub fn new(key: OsString, data: &str) -> Result<Self> {
        let mut file_name = key
            .to_str()
            .ok_or_eyre("failed to convert osstring to string slice")?
            .to_owned();
        file_name.truncate(
            file_name
                .rfind(MAP_EXTENSION)
                .ok_or_eyre("failed to find extension in file name")?,
        );

        let rows: Vec<&str> = data.trim().lines().map(str::trim_end).collect();
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        ensure!(width > 0, "map {file_name} has no cells");

        let mut blocked = Vec::new();
        let mut costs = Vec::new();
        let mut start = None;
        let mut goal = None;

        for (row, line) in rows.iter().enumerate() {
            ensure!(
                line.chars().count() == width,
                "row {row} of map {file_name} has {} cells, expected {width}",
                line.chars().count()
            );

            for (col, symbol) in line.chars().enumerate() {
                let coord = Coord::new(row, col);
                match symbol {
                    WALL => blocked.push(coord),
                    OPEN => {}
                    START => {
                        ensure!(
                            start.replace(coord).is_none(),
                            "map {file_name} has more than one start"
                        );
                    }
                    GOAL => {
                        ensure!(
                            goal.replace(coord).is_none(),
                            "map {file_name} has more than one goal"
                        );
                    }
                    '2'..='9' => {
                        let cost = symbol
                            .to_digit(10)
                            .ok_or_eyre("failed to convert cost digit")?;
                        costs.push((coord, f64::from(cost)));
                    }
                    other => bail!("unexpected symbol {other:?} at {coord} in map {file_name}"),
                }
            }
        }

        let start = start.ok_or_eyre("map has no start cell")?;
        let goal = goal.ok_or_eyre("map has no goal cell")?;
        let grid = Grid::build(width, height, blocked, costs)?;

        Ok(Self {
            key: file_name,
            grid,
            start,
            goal,
        })
    }
}

/// Default map used when no map file is given.
static DEFAULT_MAP: LazyLock<&str> = LazyLock::new(|| {
    "\
###############################
#S....#.........#.......#.....#
#.###.#.#######.#.#####.#.###.#
#.#...#.....#...#.#...#...#...#
#.#.#######.#.###.#.#.#####.###
#.#.......#.#.....#.#.......#.#
#.#######.#.#######.#######.#.#
#.....#...#.....33333...#...#.#
#####.#.#######.#####.#.#.###.#
#...#.#.#.....#.....#.#.#.....#
#.#.#.#.#.###.#####.#.#.#####.#
#.#...#...#.999.....#.#.....#.#
#.#########.#########.#####.#.#
#..........2222222..........#G#
###############################"
});
