// =============================================================================
// Channel State — per-bar record and the keyed store that owns it
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::market_data::Bar;
use crate::types::Direction;

/// Trail levels shown for a bar.  Display only; never fed back into the
/// recursion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotLevels {
    pub long: f64,
    pub short: f64,
}

/// Channel result for one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Bars since the long trail last reset, in `[1, max_look_back]`.
    pub since_long_reset: usize,
    /// Bars since the short trail last reset, in `[1, max_look_back]`.
    pub since_short_reset: usize,
    pub long_trail: f64,
    pub short_trail: f64,
    /// Volatility margin handed to the next bar's computation.
    pub buffer: f64,
    /// The long trail reset on this bar.
    pub long_reset: bool,
    /// The short trail reset on this bar.
    pub short_reset: bool,
    #[serde(default)]
    pub plot: Option<PlotLevels>,
}

impl ChannelState {
    pub fn since_reset(&self, direction: Direction) -> usize {
        match direction {
            Direction::Long => self.since_long_reset,
            Direction::Short => self.since_short_reset,
        }
    }

    pub fn trail(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Long => self.long_trail,
            Direction::Short => self.short_trail,
        }
    }

    pub fn did_reset(&self, direction: Direction) -> bool {
        match direction {
            Direction::Long => self.long_reset,
            Direction::Short => self.short_reset,
        }
    }

    /// Both trail levels, as shown one bar later.
    pub fn levels(&self) -> PlotLevels {
        PlotLevels {
            long: self.long_trail,
            short: self.short_trail,
        }
    }
}

// =============================================================================
// ChannelStore
// =============================================================================

/// Channel states keyed by bar `open_time`, ordered oldest first.
///
/// Records are only ever replaced whole.
#[derive(Debug, Default, Clone)]
pub struct ChannelStore {
    states: BTreeMap<i64, ChannelState>,
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bar: &Bar) -> Option<&ChannelState> {
        self.states.get(&bar.open_time)
    }

    /// Store `state` for `bar`, replacing any previous record.
    pub fn write(&mut self, bar: &Bar, state: ChannelState) {
        self.states.insert(bar.open_time, state);
    }

    /// Drop every record for bars that opened before `open_time`.
    pub fn retain_since(&mut self, open_time: i64) {
        self.states = self.states.split_off(&open_time);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Records in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&i64, &ChannelState)> {
        self.states.iter()
    }
}
