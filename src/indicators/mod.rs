// =============================================================================
// Indicator Primitives
// =============================================================================
//
// Pure, side-effect-free helpers used by the trail channel.  Every public
// function returns `Option<T>` so callers are forced to handle
// insufficient-data and numerical-edge-case scenarios.

pub mod clean_range;
pub mod extremes;

pub use clean_range::clean_range;
pub use extremes::{highest, lowest};
