//! Property-based tests for the trail channel using proptest.
//!
//! These check invariants that must hold for any bar history, using randomly
//! generated OHLC series.

use proptest::prelude::*;

use trail_channel::{Bar, ChannelConfig, TrailChannel};

// ==================== Test Data Generators ====================

/// Random `(high, low)` pairs, oldest first, with `high >= low`.
fn arb_bars(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((50.0..150.0_f64, 0.0..8.0_f64), min_len..=max_len)
        .prop_map(|data| data.into_iter().map(|(low, spread)| (low + spread, low)).collect())
}

/// Most-recent-first bars, all flagged changed.
fn to_bars(chrono: &[(f64, f64)]) -> Vec<Bar> {
    chrono
        .iter()
        .enumerate()
        .map(|(i, &(high, low))| Bar {
            open_time: i as i64 * 60_000,
            open: low,
            high,
            low,
            close: (high + low) / 2.0,
            volume: 0.0,
            changed: true,
        })
        .rev()
        .collect()
}

/// The same history mirrored through zero: `(high, low) -> (-low, -high)`.
fn inverted(chrono: &[(f64, f64)]) -> Vec<(f64, f64)> {
    chrono.iter().map(|&(high, low)| (-low, -high)).collect()
}

fn scanned(bars: &[Bar]) -> TrailChannel {
    let mut channel = TrailChannel::new(ChannelConfig::default()).unwrap();
    channel.on_tick(bars).unwrap();
    channel
}

// ==================== Channel Properties ====================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The long side of a history is the negated short side of its mirror.
    #[test]
    fn prop_direction_symmetry(chrono in arb_bars(20, 80)) {
        let bars = to_bars(&chrono);
        let mirror = to_bars(&inverted(&chrono));

        let a = scanned(&bars);
        let b = scanned(&mirror);

        for (bar, mirrored) in bars.iter().zip(mirror.iter()) {
            match (a.state(bar), b.state(mirrored)) {
                (Some(s), Some(m)) => {
                    prop_assert!((s.long_trail + m.short_trail).abs() < 1e-9);
                    prop_assert!((s.short_trail + m.long_trail).abs() < 1e-9);
                    prop_assert_eq!(s.since_long_reset, m.since_short_reset);
                    prop_assert_eq!(s.since_short_reset, m.since_long_reset);
                    prop_assert_eq!(s.long_reset, m.short_reset);
                    prop_assert_eq!(s.short_reset, m.long_reset);
                }
                (None, None) => {}
                _ => prop_assert!(false, "state present on one side only"),
            }
        }
    }

    /// Reset counters stay within [1, max_look_back]; a reset sets them to
    /// move_length + 1, which is 2 or 3.
    #[test]
    fn prop_since_reset_bounds(chrono in arb_bars(20, 80)) {
        let bars = to_bars(&chrono);
        let channel = scanned(&bars);
        let max_look_back = channel.config().max_look_back;

        for (_, s) in channel.store().iter() {
            for (since, reset) in [
                (s.since_long_reset, s.long_reset),
                (s.since_short_reset, s.short_reset),
            ] {
                prop_assert!((1..=max_look_back).contains(&since));
                if reset {
                    prop_assert!(since == 2 || since == 3);
                }
            }
        }
    }

    /// Every plotted level is a finite price.
    #[test]
    fn prop_levels_are_finite(chrono in arb_bars(20, 80)) {
        let bars = to_bars(&chrono);
        let channel = scanned(&bars);

        for bar in &bars {
            let (long, short) = channel.display(bar);
            prop_assert!(long.is_finite());
            prop_assert!(short.is_finite());
        }
    }

    /// Two scans of the same history produce identical states.
    #[test]
    fn prop_scan_is_deterministic(chrono in arb_bars(20, 60)) {
        let bars = to_bars(&chrono);
        let a = scanned(&bars);
        let b = scanned(&bars);

        for bar in &bars {
            prop_assert_eq!(a.state(bar), b.state(bar));
        }
    }
}
