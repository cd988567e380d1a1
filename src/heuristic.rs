//! Distance estimates used to guide the search.
//!
//! Any `Fn(Coord, Coord) -> f64` is a [`Heuristic`], so callers can plug in their own estimate.
//! The built-in metrics live in [`Distance`], and [`Weighted`] scales any of them.

use std::f64::consts::SQRT_2;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::types::{Coord, Neighborhood};

/// Estimate of the remaining cost between two coordinates.
///
/// Implementations must return a finite, non-negative number. The engine rejects anything else
/// with [`SearchError::InvalidHeuristic`](crate::types::SearchError::InvalidHeuristic). An
/// estimate that never exceeds the true remaining cost (an admissible heuristic) guarantees an
/// optimal path. An overestimating one may still find a path, just not the cheapest.
pub trait Heuristic {
    /// Estimated cost of travelling from `from` to `to`.
    fn estimate(&self, from: Coord, to: Coord) -> f64;
}

impl<F> Heuristic for F
where
    F: Fn(Coord, Coord) -> f64,
{
    fn estimate(&self, from: Coord, to: Coord) -> f64 {
        self(from, to)
    }
}

/// Built-in distance metrics.
///
/// All of them assume a uniform cell cost of 1. On grids with cheaper cells, wrap the metric in
/// [`Weighted`] with the grid's minimum cost to keep it admissible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum Distance {
    /// Sum of row and column distance. Exact on open four-connected grids.
    Manhattan,
    /// Straight-line distance.
    Euclidean,
    /// Diagonal moves at cost √2 followed by straight moves. Exact on open eight-connected
    /// grids.
    Octile,
    /// Larger of row and column distance.
    Chebyshev,
    /// Always zero, which turns A* into Dijkstra's algorithm.
    Zero,
}

impl Distance {
    /// Tightest admissible metric for the given movement policy.
    #[must_use]
    pub const fn default_for(neighborhood: Neighborhood) -> Self {
        match neighborhood {
            Neighborhood::Four => Self::Manhattan,
            Neighborhood::Eight => Self::Octile,
        }
    }

    /// Name of the metric as accepted on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Manhattan => "manhattan",
            Self::Euclidean => "euclidean",
            Self::Octile => "octile",
            Self::Chebyshev => "chebyshev",
            Self::Zero => "zero",
        }
    }
}

impl Heuristic for Distance {
    fn estimate(&self, from: Coord, to: Coord) -> f64 {
        let (rows, cols) = from.delta(to);
        let (rows, cols) = (rows as f64, cols as f64);

        match self {
            Self::Manhattan => rows + cols,
            Self::Euclidean => rows.hypot(cols),
            Self::Octile => {
                let (short, long) = if rows < cols { (rows, cols) } else { (cols, rows) };
                short.mul_add(SQRT_2, long - short)
            }
            Self::Chebyshev => rows.max(cols),
            Self::Zero => 0.,
        }
    }
}

/// A heuristic scaled by a constant factor.
///
/// A factor above 1 trades optimality for fewer expansions (weighted A*). A factor equal to the
/// cheapest cell cost keeps a unit-cost metric admissible on grids with cells cheaper than 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Weighted<H> {
    /// Underlying estimate.
    inner: H,
    /// Factor applied to every estimate.
    weight: f64,
}

impl<H: Heuristic> Weighted<H> {
    /// Wraps `inner` so that every estimate is multiplied by `weight`.
    #[must_use]
    pub const fn new(inner: H, weight: f64) -> Self {
        Self { inner, weight }
    }

    /// Factor applied to every estimate.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

impl<H: Heuristic> Heuristic for Weighted<H> {
    fn estimate(&self, from: Coord, to: Coord) -> f64 {
        self.inner.estimate(from, to) * self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Compares two estimates with a small tolerance.
    fn approx(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn test_metrics_on_known_offsets() {
        let from = Coord::new(0, 0);
        let to = Coord::new(3, 4);

        assert!(approx(Distance::Manhattan.estimate(from, to), 7.));
        assert!(approx(Distance::Euclidean.estimate(from, to), 5.));
        assert!(approx(Distance::Octile.estimate(from, to), 3. * SQRT_2 + 1.));
        assert!(approx(Distance::Chebyshev.estimate(from, to), 4.));
        assert!(approx(Distance::Zero.estimate(from, to), 0.));
    }

    #[test]
    fn test_metrics_are_symmetric_and_zero_on_identity() {
        let first = Coord::new(5, 1);
        let second = Coord::new(2, 7);

        for metric in [
            Distance::Manhattan,
            Distance::Euclidean,
            Distance::Octile,
            Distance::Chebyshev,
            Distance::Zero,
        ] {
            assert!(approx(
                metric.estimate(first, second),
                metric.estimate(second, first)
            ));
            assert!(approx(metric.estimate(first, first), 0.));
        }
    }

    #[test]
    fn test_default_metric_per_neighborhood() {
        assert_eq!(Distance::default_for(Neighborhood::Four), Distance::Manhattan);
        assert_eq!(Distance::default_for(Neighborhood::Eight), Distance::Octile);
    }

    #[test]
    fn test_closures_are_heuristics() {
        let constant = |_: Coord, _: Coord| 2.5;

        assert!(approx(
            constant.estimate(Coord::new(0, 0), Coord::new(1, 1)),
            2.5
        ));
    }

    #[test]
    fn test_weighted_scales_inner_estimate() {
        let weighted = Weighted::new(Distance::Manhattan, 3.);

        assert!(approx(weighted.weight(), 3.));
        assert!(approx(
            weighted.estimate(Coord::new(0, 0), Coord::new(1, 1)),
            6.
        ));
    }
}
