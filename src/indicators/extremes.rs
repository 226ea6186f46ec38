// =============================================================================
// Extreme Window — highest / lowest over a most-recent-first bar window
// =============================================================================
//
// Both helpers look at bars[offset .. offset + length] where index 0 is the
// current bar and larger indices are older.  The window is clipped to the
// bars that exist.  An empty window yields `None` rather than a sentinel
// number, so callers combining several candidates with max/min can let the
// remaining candidates decide.
// =============================================================================

use crate::market_data::Bar;
use crate::types::PriceField;

/// Maximum of `field` over `length` bars starting at `offset`.
pub fn highest(bars: &[Bar], length: usize, offset: usize, field: PriceField) -> Option<f64> {
    window(bars, length, offset)
        .iter()
        .map(|b| b.value(field))
        .reduce(f64::max)
}

/// Minimum of `field` over `length` bars starting at `offset`.
pub fn lowest(bars: &[Bar], length: usize, offset: usize, field: PriceField) -> Option<f64> {
    window(bars, length, offset)
        .iter()
        .map(|b| b.value(field))
        .reduce(f64::min)
}

fn window(bars: &[Bar], length: usize, offset: usize) -> &[Bar] {
    let start = offset.min(bars.len());
    let end = offset.saturating_add(length).min(bars.len());
    &bars[start..end]
}
