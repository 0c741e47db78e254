//! Frame integrity predicate.
//!
//! A portal frame can be partially destroyed by the world after it is
//! placed. The portal stays usable while at least half of its original
//! elements remain intact; below that it is swept away.

use stormgate_types::{FrameHandle, FrameMaterializer};

/// Whether a frame retains at least half of its original elements.
///
/// The threshold truncates: a 13-element frame survives down to 6 intact
/// elements. An empty frame (total 0) counts as intact; its portal's
/// validity then rests on the storm alone.
pub fn frame_is_intact(intact: u32, total: u32) -> bool {
    let threshold = total.checked_div(2).unwrap_or(0);
    intact >= threshold
}

/// Query the materializer and apply the half-intact rule.
pub fn handle_is_intact(materializer: &dyn FrameMaterializer, handle: FrameHandle) -> bool {
    frame_is_intact(
        materializer.intact_elements(handle),
        materializer.total_elements(handle),
    )
}
