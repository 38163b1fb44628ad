//! WGS84 coordinates and great-circle distance.

use thiserror::Error;

/// Earth radius in meters, as used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_378_100.0;

/// A coordinate failed the finite-pair invariant.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[error("invalid coordinate ({lat}, {lon}): latitude must be finite in [-90, 90], longitude finite in [-180, 180]")]
pub struct InvalidCoordinate {
    pub lat: f64,
    pub lon: f64,
}

/// A geographic position as a latitude/longitude pair in degrees.
///
/// Serializes as a two-element array `[lat, lon]`, the wire shape of the
/// control plane's `StartCoord` field. Deserialization enforces the
/// finite-pair invariant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "[f64; 2]", into = "[f64; 2]")
)]
pub struct GeoCoord {
    /// Latitude in degrees, [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, [-180, 180]
    pub lon: f64,
}

impl GeoCoord {
    /// Create a coordinate without validation.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Create a coordinate, enforcing the finite-pair invariant.
    pub fn checked(lat: f64, lon: f64) -> Result<Self, InvalidCoordinate> {
        let coord = Self { lat, lon };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(InvalidCoordinate { lat, lon })
        }
    }

    /// Whether both components are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance to another coordinate, in meters (haversine).
    pub fn distance_m(&self, other: &Self) -> f64 {
        let la1 = self.lat.to_radians();
        let lo1 = self.lon.to_radians();
        let la2 = other.lat.to_radians();
        let lo2 = other.lon.to_radians();

        let h = hsin(la2 - la1) + la1.cos() * la2.cos() * hsin(lo2 - lo1);

        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }
}

fn hsin(theta: f64) -> f64 {
    (theta / 2.0).sin().powi(2)
}

impl TryFrom<[f64; 2]> for GeoCoord {
    type Error = InvalidCoordinate;

    fn try_from([lat, lon]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::checked(lat, lon)
    }
}

impl From<GeoCoord> for [f64; 2] {
    fn from(c: GeoCoord) -> Self {
        [c.lat, c.lon]
    }
}

impl std::fmt::Display for GeoCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lat, self.lon)
    }
}
