//! Storm intensity model and storm queries.
//!
//! Intensity is a derived 0--100 measure of where a storm sits on its
//! lifecycle curve. Storms build up and then taper off rather than ending
//! abruptly: the curve is a symmetric triangular ramp that peaks at the
//! halfway point of the storm's total duration.

use stormgate_types::{Anchor, Storm};

/// Maximum intensity value on the 0--100 scale.
pub const MAX_INTENSITY: u32 = 100;

/// Compute a storm's intensity on the 0--100 scale.
///
/// With `progress = 1 - remaining/total` clamped to `[0, 1]`, intensity
/// follows `progress < 0.5 ? 2*progress : 2*(1 - progress)` scaled to an
/// integer 0--100 (truncating). A storm with no total duration has
/// intensity 0.
///
/// Fixed points for `total = 100`: remaining 100 -> 0, remaining 75 -> 50,
/// remaining 50 -> 100, remaining 0 -> 0.
pub fn storm_intensity(storm: &Storm) -> u32 {
    intensity(storm.total_secs, storm.remaining_secs)
}

/// Intensity from raw duration figures. See [`storm_intensity`].
pub fn intensity(total_secs: u64, remaining_secs: u64) -> u32 {
    if total_secs == 0 {
        return 0;
    }
    let remaining = remaining_secs.min(total_secs);
    let elapsed = total_secs.saturating_sub(remaining);

    // First half of the storm's life: remaining*2 >= total. The ramp-up
    // scales elapsed time; the ramp-down scales remaining time. Both are
    // `200 * numerator / total`, truncated.
    let numerator = if remaining.saturating_mul(2) >= total_secs {
        elapsed
    } else {
        remaining
    };
    let scaled = numerator
        .saturating_mul(200)
        .checked_div(total_secs)
        .unwrap_or(0);

    u32::try_from(scaled.min(u64::from(MAX_INTENSITY))).unwrap_or(MAX_INTENSITY)
}

/// Find the nearest storm to an anchor, ignoring storms in other regions.
pub fn nearest_storm(storms: &[Storm], anchor: &Anchor) -> Option<Storm> {
    let mut nearest: Option<(f64, &Storm)> = None;
    for storm in storms {
        let Some(distance) = anchor.distance_to(&storm.epicenter) else {
            continue;
        };
        match nearest {
            Some((best, _)) if distance >= best => {}
            _ => nearest = Some((distance, storm)),
        }
    }
    nearest.map(|(_, storm)| storm.clone())
}

/// Whether any storm meets the given minimum intensity.
pub fn has_qualifying_storm(storms: &[Storm], min_intensity: u32) -> bool {
    storms.iter().any(|s| storm_intensity(s) >= min_intensity)
}
