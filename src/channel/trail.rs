// =============================================================================
// Trail Recursion — one side of the channel for one bar
// =============================================================================
//
// Long side (the short side mirrors it with high/low swapped and every
// comparison inverted):
//
//   range = highest(High, 2 bars from offset + move_length)
//   move  = High[offset] - range
//
//   reset when all of
//     move > threshold                      (large excursion)
//     prior since_reset >= move_length      (previous trend had matured)
//     Low[offset] < Low[0]                  (offset bar dipped below current)
//     range       < Low[0]                  (older extreme is below current)
//
//   since_reset = reset ? move_length + 1 : min(prior + 1, max_look_back)
//
//   trail = max( lowest(Low, since_reset - 1) - max_dist,
//                lowest(Low, since_reset)     - prior buffer )
//
// The only history read besides the raw bars is the state of bar 1.
// =============================================================================

use tracing::debug;

use super::state::ChannelState;
use crate::error::{ChannelError, Result};
use crate::indicators::{highest, lowest};
use crate::market_data::Bar;
use crate::types::{Direction, PriceField};

/// Inputs shared by both sides for a single bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailParams {
    /// Index of the bar whose excursion is tested; always 1 in the channel.
    pub offset: usize,
    /// 1 or 2: how far beyond `offset` the reference window starts.
    pub move_length: usize,
    pub threshold: f64,
    pub max_dist: f64,
    pub max_look_back: usize,
}

/// Result of one trail update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailStep {
    pub since_reset: usize,
    pub trail: f64,
    pub reset: bool,
}

/// Compute the new `(since_reset, trail)` for `direction` on `bars[0]`,
/// given the state of `bars[1]` (`None` on cold start).
pub fn calc_trail(
    bars: &[Bar],
    prior: Option<&ChannelState>,
    direction: Direction,
    params: &TrailParams,
) -> Result<TrailStep> {
    let offset = params.offset;
    let required = offset + params.move_length + 2;
    if bars.len() < required {
        return Err(ChannelError::insufficient_history(required, bars.len()));
    }

    let current = &bars[0];
    let at_offset = &bars[offset];
    let window_start = offset + params.move_length;

    let (range, movement, last_value, offset_value) = match direction {
        Direction::Long => {
            let range = highest(bars, 2, window_start, PriceField::High)
                .ok_or_else(|| ChannelError::insufficient_history(required, bars.len()))?;
            (range, at_offset.high - range, current.low, at_offset.low)
        }
        Direction::Short => {
            let range = lowest(bars, 2, window_start, PriceField::Low)
                .ok_or_else(|| ChannelError::insufficient_history(required, bars.len()))?;
            (range, range - at_offset.low, current.high, at_offset.high)
        }
    };

    let (last_since_reset, last_buffer) =
        prior.map_or((0, 0.0), |p| (p.since_reset(direction), p.buffer));

    let sign = direction.sign();
    let reset = movement > params.threshold
        && last_since_reset >= params.move_length
        && (offset_value - last_value) * sign < 0.0
        && (range - last_value) * sign < 0.0;

    let since_reset = if reset {
        params.move_length + 1
    } else {
        (last_since_reset + 1).min(params.max_look_back)
    };

    if reset {
        debug!(
            direction = %direction,
            open_time = current.open_time,
            movement,
            threshold = params.threshold,
            since_reset,
            "trail reset"
        );
    }

    let trail = match direction {
        Direction::Long => combine(
            lowest(bars, since_reset - 1, 0, PriceField::Low).map(|v| v - params.max_dist),
            lowest(bars, since_reset, 0, PriceField::Low).map(|v| v - last_buffer),
            f64::max,
        ),
        Direction::Short => combine(
            highest(bars, since_reset - 1, 0, PriceField::High).map(|v| v + params.max_dist),
            highest(bars, since_reset, 0, PriceField::High).map(|v| v + last_buffer),
            f64::min,
        ),
    }
    .ok_or_else(|| ChannelError::insufficient_history(since_reset, bars.len()))?;

    Ok(TrailStep {
        since_reset,
        trail,
        reset,
    })
}

/// Pick between two candidate levels; an empty window yields to the other.
fn combine(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (Some(v), None) | (None, Some(v)) => Some(v),
        (None, None) => None,
    }
}
