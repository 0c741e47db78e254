//! Storm and world mechanics for Stormgate.
//!
//! Pure logic over the shared types: the storm intensity curve, spatial
//! storm queries, the portal site search, and the frame integrity rule.
//! Nothing here touches the world directly -- all physical access goes
//! through the [`Terrain`] and [`FrameMaterializer`] contracts.
//!
//! [`Terrain`]: stormgate_types::Terrain
//! [`FrameMaterializer`]: stormgate_types::FrameMaterializer

pub mod frame;
pub mod siting;
pub mod storm;

pub use frame::{frame_is_intact, handle_is_intact};
pub use siting::{RadiusBand, SITE_ATTEMPTS, find_portal_site, is_safe_site};
pub use storm::{MAX_INTENSITY, has_qualifying_storm, intensity, nearest_storm, storm_intensity};
