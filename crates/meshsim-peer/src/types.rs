//! Identity and time primitives for the mesh network.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque payload of a mesh message.
pub type Payload = String;

/// Open string-to-string metadata attached to a peer at creation.
pub type Metadata = BTreeMap<String, String>;

/// Uniquely identifies a peer in the mesh network.
///
/// Assigned at creation, immutable, and never reused: identifiers are
/// random UUIDs, so a deleted peer's identifier never resolves again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Allocate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timestamp on the simulated network clock, in milliseconds.
///
/// Monotonically non-decreasing across tick cycles; a given value is
/// delivered to a given peer at most once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NetTime(i64);

impl NetTime {
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peer_ids_are_unique() {
        let a = PeerId::random();
        let b = PeerId::random();
        assert_ne!(a, b);
    }

    #[test]
    fn peer_id_roundtrips_through_display() {
        let id = PeerId::random();
        assert_eq!(PeerId::from(id.to_string()), id);
    }

    #[test]
    fn net_time_ordering() {
        assert!(NetTime::from_millis(100) < NetTime::from_millis(200));
        assert_eq!(NetTime::from_millis(100).as_millis(), 100);
    }

    #[test]
    fn peer_id_serializes_as_bare_string() {
        let id = PeerId::from("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
    }
}
