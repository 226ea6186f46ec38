// =============================================================================
// Trail Channel — incremental scan over the bar history
// =============================================================================
//
// On every tick the history is walked from the oldest computable bar
// (index len - max_look_back) to the current bar (index 0), i.e. in
// chronological order, so each recomputed bar sees the fresh state of the bar
// before it.  Bars without the `changed` flag keep their stored state.
//
// The plotted levels of bar i are the trails computed for bar i + 1: the chart
// shows the channel as it was known one bar earlier, never a level derived
// from the bar that is still forming.
// =============================================================================

use tracing::debug;

use super::processor::ChannelProcessor;
use super::state::{ChannelState, ChannelStore};
use crate::channel_config::ChannelConfig;
use crate::error::Result;
use crate::market_data::Bar;

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Bars whose state was (re)computed.
    pub recomputed: usize,
    /// Bars past the warm-up window that were left untouched.
    pub unchanged: usize,
}

/// Trailing price channel over a single bar history.
#[derive(Debug, Clone)]
pub struct TrailChannel {
    processor: ChannelProcessor,
}

impl TrailChannel {
    pub fn new(config: ChannelConfig) -> Result<Self> {
        Ok(Self {
            processor: ChannelProcessor::new(config)?,
        })
    }

    /// Identifier of this parameter set, e.g. `TrailChannel(15,0.9,0.05,2)`.
    pub fn label(&self) -> String {
        self.processor.config().to_string()
    }

    pub fn config(&self) -> &ChannelConfig {
        self.processor.config()
    }

    pub fn store(&self) -> &ChannelStore {
        self.processor.store()
    }

    /// Authoritative channel state of `bar`, if computed.
    pub fn state(&self, bar: &Bar) -> Option<&ChannelState> {
        self.processor.state(bar)
    }

    /// Recompute every changed bar of the most-recent-first history `bars`.
    ///
    /// The oldest `max_look_back - 1` bars only serve as warm-up and never
    /// get a state.  Afterwards states of bars no longer in `bars` are
    /// dropped, also when the scan stops on an error.  A failed scan keeps
    /// the states written for the older bars before the failing one.
    pub fn on_tick(&mut self, bars: &[Bar]) -> Result<ScanReport> {
        let mut report = ScanReport::default();
        let scanned = self.scan(bars, &mut report);

        if let Some(oldest) = bars.last() {
            self.processor.store_mut().retain_since(oldest.open_time);
        }

        scanned.map(|()| report)
    }

    fn scan(&mut self, bars: &[Bar], report: &mut ScanReport) -> Result<()> {
        let Some(first) = bars.len().checked_sub(self.processor.config().max_look_back) else {
            debug!(bars = bars.len(), "not enough bars to scan yet");
            return Ok(());
        };

        for idx in (0..=first).rev() {
            let bar = &bars[idx];
            if !bar.changed {
                report.unchanged += 1;
                continue;
            }

            let state = self.processor.process_bar(&bars[idx..])?;
            let plot = bars
                .get(idx + 1)
                .and_then(|older| self.processor.state(older))
                .map(ChannelState::levels);

            debug!(
                open_time = bar.open_time,
                long_trail = state.long_trail,
                short_trail = state.short_trail,
                since_long_reset = state.since_long_reset,
                since_short_reset = state.since_short_reset,
                "channel updated"
            );

            self.processor
                .store_mut()
                .write(bar, ChannelState { plot, ..state });
            report.recomputed += 1;
        }

        Ok(())
    }

    /// Levels to plot for `bar` as `(long, short)`; `(close, close)` when
    /// nothing has been computed for it.
    pub fn display(&self, bar: &Bar) -> (f64, f64) {
        self.state(bar)
            .and_then(|s| s.plot)
            .map_or((bar.close, bar.close), |p| (p.long, p.short))
    }
}
