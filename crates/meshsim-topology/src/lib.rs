//! Meshsim Topology
//!
//! Geographic primitives and the reachability oracle for the mesh peer
//! simulator.
//!
//! Peers live at WGS84 latitude/longitude coordinates. Reachability is a
//! derived, undirected relation between peers: two peers are "in range" when
//! the great-circle distance between their coordinates is below the oracle's
//! range. The relation is recomputed every tick cycle and never stored as
//! peer state; the event router diffs consecutive computations to produce
//! appeared/disappeared transitions.

mod coord;
mod diff;
mod oracle;

pub use coord::{GeoCoord, InvalidCoordinate, EARTH_RADIUS_M};
pub use diff::diff_sets;
pub use oracle::{ProximityOracle, ReachabilityOracle, DEFAULT_RANGE_M};
