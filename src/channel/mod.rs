// =============================================================================
// Trail Channel Module
// =============================================================================
//
// Long floor and short ceiling that follow price and reset on confirmed
// breakouts.  `trail` holds the per-side recursion, `processor` one full
// update for a bar, `scanner` the incremental walk over the history.

pub mod processor;
pub mod scanner;
pub mod state;
pub mod trail;

pub use processor::ChannelProcessor;
pub use scanner::{ScanReport, TrailChannel};
pub use state::{ChannelState, ChannelStore, PlotLevels};
pub use trail::{calc_trail, TrailParams, TrailStep};
