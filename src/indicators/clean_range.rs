// =============================================================================
// Clean Range — trimmed-mean bar range
// =============================================================================
//
// A volatility estimate that is robust to a few outsized bars:
//
//   ranges  = [H - L for each bar in the window]
//   sorted  = ranges sorted descending
//   ignored = length / 5            (top 20 % of the requested window)
//   clean   = mean(sorted[ignored..])
//
// The trim count is taken from the *requested* window length, so a window
// that runs past the available history shrinks without trimming fewer bars.
// =============================================================================

use crate::market_data::Bar;

/// Compute the trimmed-mean range of the `length` bars starting at `offset`
/// (index 0 = most recent bar).
///
/// # Returns
/// `None` when:
/// - Nothing is left once the top `length / 5` ranges are discarded (the
///   window is too short, or lies past the end of the history).
/// - The result is non-finite.
pub fn clean_range(bars: &[Bar], offset: usize, length: usize) -> Option<f64> {
    let mut ranges: Vec<f64> = bars
        .iter()
        .skip(offset)
        .take(length)
        .map(Bar::range)
        .collect();

    let ignored = length / 5;
    if ranges.len() <= ignored {
        return None;
    }

    ranges.sort_by(|a, b| b.total_cmp(a));

    let kept = &ranges[ignored..];
    let mean = kept.iter().sum::<f64>() / kept.len() as f64;

    if mean.is_finite() {
        Some(mean)
    } else {
        None
    }
}
