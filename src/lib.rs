// =============================================================================
// Trail Channel — adaptive support/resistance channel for trading strategies
// =============================================================================
//
// Computes a trailing price channel from a most-recent-first bar history:
// a trimmed-mean volatility estimate feeds a long-side floor and a short-side
// ceiling that trail price and reset on confirmed breakouts.
// =============================================================================

pub mod channel;
pub mod channel_config;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod types;

pub use channel::{ChannelState, ScanReport, TrailChannel};
pub use channel_config::ChannelConfig;
pub use error::{ChannelError, Result};
pub use market_data::{Bar, BarSeries};
pub use types::{Direction, PriceField};
