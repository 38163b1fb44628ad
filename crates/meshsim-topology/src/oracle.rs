//! The reachability oracle: which peer pairs are currently in range.

use crate::coord::GeoCoord;

/// Default communication range in meters.
pub const DEFAULT_RANGE_M: f64 = 50.0;

/// Computes the undirected reachability relation over a set of positions.
///
/// The oracle sees positions only; peer identity is the caller's concern.
/// Returned edges are index pairs `(i, j)` with `i < j` into the input
/// slice, each pair reported at most once.
pub trait ReachabilityOracle: Send + Sync {
    /// Compute the edge set for the given positions.
    fn edges(&self, positions: &[GeoCoord]) -> Vec<(usize, usize)>;
}

/// Range-based oracle: two peers are in range when the great-circle
/// distance between them is strictly below `max_range_m`.
#[derive(Debug, Clone, Copy)]
pub struct ProximityOracle {
    /// Maximum communication range in meters.
    pub max_range_m: f64,
}

impl Default for ProximityOracle {
    fn default() -> Self {
        Self {
            max_range_m: DEFAULT_RANGE_M,
        }
    }
}

impl ProximityOracle {
    /// Create an oracle with the given range in meters.
    pub fn new(max_range_m: f64) -> Self {
        Self { max_range_m }
    }
}

impl ReachabilityOracle for ProximityOracle {
    fn edges(&self, positions: &[GeoCoord]) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for i in 0..positions.len() {
            for j in (i + 1)..positions.len() {
                if positions[i].distance_m(&positions[j]) < self.max_range_m {
                    edges.push((i, j));
                }
            }
        }
        edges
    }
}
