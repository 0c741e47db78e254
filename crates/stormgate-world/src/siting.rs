//! Portal site search near a storm epicenter.
//!
//! A portal wants open, solid ground inside a radius band around the
//! storm. The search makes a small fixed number of random attempts and
//! degrades to the epicenter's own surface anchor when none of them land
//! on safe ground -- siting failure is never fatal to a spawn.

use std::f64::consts::TAU;

use rand::Rng;
use tracing::debug;

use stormgate_types::{Anchor, Storm, Terrain};

/// Number of random placement attempts before falling back.
pub const SITE_ATTEMPTS: u32 = 10;

/// Radius band for the site search, in blocks around the epicenter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusBand {
    /// Minimum distance from the storm epicenter.
    pub min: f64,
    /// Maximum distance from the storm epicenter.
    pub max: f64,
}

impl RadiusBand {
    /// Create a band, swapping the bounds if given out of order.
    pub fn new(min: f64, max: f64) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }
}

/// Whether an anchor is safe to host a portal: solid ground directly
/// below, and the anchor plus the block above it unobstructed.
pub fn is_safe_site(terrain: &dyn Terrain, anchor: &Anchor) -> bool {
    terrain.is_solid_below(anchor) && terrain.is_unobstructed(anchor)
}

/// Find a portal site near the storm.
///
/// Makes [`SITE_ATTEMPTS`] attempts at a random angle and a random radius
/// within the band, taking the surface anchor at each candidate column.
/// The first safe candidate wins. When every attempt fails, falls back to
/// the surface anchor at the epicenter itself.
pub fn find_portal_site(
    terrain: &dyn Terrain,
    storm: &Storm,
    band: RadiusBand,
    rng: &mut impl Rng,
) -> Anchor {
    let center = &storm.epicenter;
    let span = band.max - band.min;

    for _ in 0..SITE_ATTEMPTS {
        let angle: f64 = rng.random_range(0.0..TAU);
        let radius = if span > 0.0 {
            band.min + rng.random_range(0.0..span)
        } else {
            band.min
        };

        let x = center.position.x + angle.cos() * radius;
        let z = center.position.z + angle.sin() * radius;
        let candidate = terrain.surface_anchor(&center.region, x, z);

        if is_safe_site(terrain, &candidate) {
            return candidate;
        }
    }

    debug!(storm_id = %storm.id, "no safe portal site found, using epicenter surface");
    terrain.surface_anchor(&center.region, center.position.x, center.position.z)
}
