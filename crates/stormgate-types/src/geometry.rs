//! World geometry: regions, positions, and anchors.
//!
//! A [`Position`] is a point in a region's 3D coordinate space. An
//! [`Anchor`] pairs a position with the [`RegionId`] it belongs to --
//! distances between anchors in different regions are undefined, and every
//! spatial query filters by region before comparing coordinates.

use serde::{Deserialize, Serialize};

/// Identifier for a spatial partition (a world or region name).
///
/// Two anchors are only comparable when their regions match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionId(pub String);

impl RegionId {
    /// Create a region id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the region name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RegionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A point in a region's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
    /// North-south coordinate.
    pub z: f64,
}

impl Position {
    /// Create a position from coordinates.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position in the same region.
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx.mul_add(dx, dy.mul_add(dy, dz * dz)).sqrt()
    }

    /// Return a new position offset by the given deltas.
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.0}, {:.0}, {:.0}", self.x, self.y, self.z)
    }
}

/// A region-qualified position: the spatial identity of a portal, storm
/// epicenter, or player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// The spatial partition this anchor lives in.
    pub region: RegionId,
    /// The point within that region.
    pub position: Position,
}

impl Anchor {
    /// Create an anchor from a region and position.
    pub const fn new(region: RegionId, position: Position) -> Self {
        Self { region, position }
    }

    /// Distance to another anchor, or `None` when the regions differ.
    pub fn distance_to(&self, other: &Self) -> Option<f64> {
        if self.region == other.region {
            Some(self.position.distance_to(&other.position))
        } else {
            None
        }
    }
}

impl core::fmt::Display for Anchor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.region, self.position)
    }
}
