use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::PriceField;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
///
/// `open_time` (ms since epoch) is the bar identity: channel state is keyed by
/// it. `changed` is set whenever the bar was appended or rewritten since the
/// last scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub changed: bool,
}

impl Bar {
    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn value(&self, field: PriceField) -> f64 {
        match field {
            PriceField::High => self.high,
            PriceField::Low => self.low,
        }
    }
}

// ---------------------------------------------------------------------------
// BarSeries -- most-recent-first bar history
// ---------------------------------------------------------------------------

/// Bar history for a single instrument, held most-recent-first so that
/// `bars()[0]` is the current (possibly still forming) bar.
///
/// Every bar written through [`BarSeries::update`] is flagged `changed`; the
/// flags stay set until [`BarSeries::mark_scanned`] is called after the
/// channel has consumed them.
pub struct BarSeries {
    bars: VecDeque<Bar>,
    max_bars: usize,
}

impl BarSeries {
    /// Create a series that keeps at most `max_bars` bars (at least one).
    pub fn new(max_bars: usize) -> Self {
        let max_bars = max_bars.max(1);
        Self {
            bars: VecDeque::with_capacity(max_bars + 1),
            max_bars,
        }
    }

    /// Insert or replace the current bar.
    ///
    /// * Same `open_time` as the current bar: in-progress update, replace it.
    /// * Newer `open_time`: a new bar, push it to the front and trim the
    ///   oldest bars beyond `max_bars`.
    /// * Older `open_time`: out of order, ignored.
    pub fn update(&mut self, mut bar: Bar) {
        bar.changed = true;

        match self.bars.front().map(|b| b.open_time) {
            Some(current) if current == bar.open_time => {
                self.bars[0] = bar;
            }
            Some(current) if current > bar.open_time => {
                warn!(open_time = bar.open_time, current, "ignoring out-of-order bar");
                return;
            }
            _ => {
                self.bars.push_front(bar);
                while self.bars.len() > self.max_bars {
                    self.bars.pop_back();
                }
            }
        }

        debug!(open_time = self.bars[0].open_time, close = self.bars[0].close, "bar update");
    }

    /// Most-recent-first view of the stored bars.
    pub fn bars(&mut self) -> &[Bar] {
        self.bars.make_contiguous()
    }

    /// Clear every `changed` flag once the bars have been scanned.
    pub fn mark_scanned(&mut self) {
        for bar in self.bars.iter_mut() {
            bar.changed = false;
        }
    }

    /// The current bar, if any.
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.front()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Recorded kline files
// ---------------------------------------------------------------------------

/// Load a recorded kline file (Binance REST `/klines` response format).
///
/// Bars are returned in file order, i.e. oldest first, with `changed` unset.
pub fn load_kline_file(path: impl AsRef<Path>) -> Result<Vec<Bar>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read kline file {}", path.display()))?;
    parse_kline_rows(&content)
        .with_context(|| format!("failed to parse kline file {}", path.display()))
}

/// Parse a JSON array of kline rows:
///
/// ```json
/// [[1700000000000, "37000.0", "37050.0", "36990.0", "37020.0", "123.4", ...], ...]
/// ```
///
/// Only the first six fields (open time, OHLC, volume) are read.
pub fn parse_kline_rows(text: &str) -> Result<Vec<Bar>> {
    let rows: Vec<Vec<serde_json::Value>> =
        serde_json::from_str(text).context("failed to parse kline JSON")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| parse_kline_row(row).with_context(|| format!("bad kline row {i}")))
        .collect()
}

fn parse_kline_row(row: &[serde_json::Value]) -> Result<Bar> {
    if row.len() < 6 {
        anyhow::bail!("expected at least 6 fields, got {}", row.len());
    }

    let open_time = row[0].as_i64().context("open time is not an integer")?;

    Ok(Bar {
        open_time,
        open: parse_string_f64(&row[1], "open")?,
        high: parse_string_f64(&row[2], "high")?,
        low: parse_string_f64(&row[3], "low")?,
        close: parse_string_f64(&row[4], "close")?,
        volume: parse_string_f64(&row[5], "volume")?,
        changed: false,
    })
}

/// Binance sends prices as JSON strings; accept plain numbers as well.
fn parse_string_f64(val: &serde_json::Value, name: &str) -> Result<f64> {
    match val {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .with_context(|| format!("failed to parse {name} as f64: {s}")),
        serde_json::Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("field {name} is not a valid f64")),
        _ => anyhow::bail!("field {name} has unexpected JSON type"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar(open_time: i64, close: f64) -> Bar {
        Bar {
            open_time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100.0,
            changed: false,
        }
    }

    #[test]
    fn newest_bar_is_first() {
        let mut series = BarSeries::new(10);
        for i in 0..3 {
            series.update(sample_bar(i * 60_000, 100.0 + i as f64));
        }

        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![102.0, 101.0, 100.0]);
        assert_eq!(series.latest().map(|b| b.open_time), Some(120_000));
    }

    #[test]
    fn trims_oldest_bars() {
        let mut series = BarSeries::new(3);
        for i in 0..5 {
            series.update(sample_bar(i * 60_000, 100.0 + i as f64));
        }

        assert_eq!(series.len(), 3);
        let closes: Vec<f64> = series.bars().iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![104.0, 103.0, 102.0]);
    }

    #[test]
    fn in_progress_bar_is_replaced_and_flagged() {
        let mut series = BarSeries::new(10);
        series.update(sample_bar(0, 50.0));
        series.update(sample_bar(60_000, 51.0));
        series.mark_scanned();
        assert!(series.bars().iter().all(|b| !b.changed));

        series.update(sample_bar(60_000, 53.0));
        assert_eq!(series.len(), 2);

        let bars = series.bars();
        assert!(bars[0].changed);
        assert!((bars[0].close - 53.0).abs() < f64::EPSILON);
        assert!(!bars[1].changed);
    }

    #[test]
    fn out_of_order_bar_is_ignored() {
        let mut series = BarSeries::new(10);
        series.update(sample_bar(120_000, 50.0));
        series.update(sample_bar(60_000, 10.0));

        assert_eq!(series.len(), 1);
        assert_eq!(series.latest().map(|b| b.open_time), Some(120_000));
    }

    #[test]
    fn empty_series() {
        let mut series = BarSeries::new(10);
        assert!(series.is_empty());
        assert!(series.latest().is_none());
        assert!(series.bars().is_empty());
    }

    #[test]
    fn parse_kline_rows_ok() {
        let json = r#"[
            [1700000000000, "37000.00", "37050.00", "36990.00", "37020.00", "123.456",
             1700000059999, "4567890.12", 1500, "60.123", "2224455.66", "0"],
            [1700000060000, 37020.0, 37100.0, 37010.0, 37090.0, 98.7]
        ]"#;
        let bars = parse_kline_rows(json).expect("should parse");
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open_time, 1_700_000_000_000);
        assert!((bars[0].high - 37050.0).abs() < f64::EPSILON);
        assert!((bars[1].close - 37090.0).abs() < f64::EPSILON);
        assert!(!bars[0].changed);
    }

    #[test]
    fn parse_kline_rows_rejects_short_row() {
        let json = r#"[[1700000000000, "1.0", "2.0"]]"#;
        assert!(parse_kline_rows(json).is_err());
    }

    #[test]
    fn parse_kline_rows_rejects_bad_number() {
        let json = r#"[[1700000000000, "1.0", "abc", "0.5", "1.0", "10"]]"#;
        assert!(parse_kline_rows(json).is_err());
    }
}
