// =============================================================================
// Channel Processor — one full channel update for the current bar
// =============================================================================
//
//   atr        = clean_range(bars, 0, 2 * max_look_back)
//   threshold  = atr * threshold_factor
//   max_dist   = atr * max_dist_factor
//   buffer     = atr * buffer_factor
//   move_length = 2 if range(bar 1) < range(bar 2) else 1
//
// Both sides are then updated through the trail recursion and packed into a
// fresh `ChannelState` for bars[0].
// =============================================================================

use super::state::{ChannelState, ChannelStore};
use super::trail::{calc_trail, TrailParams};
use crate::channel_config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::indicators::clean_range;
use crate::market_data::Bar;
use crate::types::Direction;

/// Fewest bars a single update can work with: the current bar, the offset bar
/// and a two-bar reference window that may start two bars further back.
pub const MIN_WINDOW: usize = 5;

/// Bar whose excursion the trail recursion tests.
const OFFSET: usize = 1;

/// Computes channel states and owns the store they are written to.
#[derive(Debug, Clone)]
pub struct ChannelProcessor {
    config: ChannelConfig,
    store: ChannelStore,
}

impl ChannelProcessor {
    /// Build a processor, rejecting an unusable configuration.
    pub fn new(config: ChannelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: ChannelStore::new(),
        })
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn store(&self) -> &ChannelStore {
        &self.store
    }

    pub(crate) fn store_mut(&mut self) -> &mut ChannelStore {
        &mut self.store
    }

    /// Stored state for `bar`, if it has been computed.
    pub fn state(&self, bar: &Bar) -> Option<&ChannelState> {
        self.store.get(bar)
    }

    /// Compute and persist the state of `bars[0]`, reading the stored state
    /// of `bars[1]` as its prior.
    pub fn process_bar(&mut self, bars: &[Bar]) -> Result<ChannelState> {
        let prior = bars.get(1).and_then(|b| self.store.get(b));
        let state = self.compute(bars, prior)?;

        if let Some(current) = bars.first() {
            self.store.write(current, state.clone());
        }
        Ok(state)
    }

    /// Compute the state of `bars[0]` from the raw bars and the state of
    /// `bars[1]` (`None` on cold start).  Nothing is stored.
    pub fn compute(&self, bars: &[Bar], prior: Option<&ChannelState>) -> Result<ChannelState> {
        if bars.len() < MIN_WINDOW {
            return Err(ChannelError::insufficient_history(MIN_WINDOW, bars.len()));
        }

        let cfg = &self.config;
        let atr_length = cfg.max_look_back.saturating_mul(2);
        let atr = clean_range(bars, 0, atr_length).ok_or_else(|| {
            ChannelError::insufficient_history(atr_length / 5 + 1, bars.len())
        })?;

        let params = TrailParams {
            offset: OFFSET,
            move_length: move_length(bars, OFFSET),
            threshold: atr * cfg.threshold_factor,
            max_dist: atr * cfg.max_dist_factor,
            max_look_back: cfg.max_look_back,
        };

        let long = calc_trail(bars, prior, Direction::Long, &params)?;
        let short = calc_trail(bars, prior, Direction::Short, &params)?;

        Ok(ChannelState {
            since_long_reset: long.since_reset,
            since_short_reset: short.since_reset,
            long_trail: long.trail,
            short_trail: short.trail,
            buffer: atr * cfg.buffer_factor,
            long_reset: long.reset,
            short_reset: short.reset,
            plot: None,
        })
    }
}

/// Widen the reference window to two bars when the offset bar is narrower
/// than the bar before it.
fn move_length(bars: &[Bar], offset: usize) -> usize {
    if bars[offset].range() < bars[offset + 1].range() {
        2
    } else {
        1
    }
}
