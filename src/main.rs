// =============================================================================
// Trail Channel — Replay Entry Point
// =============================================================================
//
// Feeds a recorded kline file through the channel one bar per tick, exactly
// as a live feed would, and logs the plotted levels and reset events.
//
//   trail-channel <klines.json>        (or CHANNEL_BARS_FILE=...)
//   CHANNEL_CONFIG=channel_config.json (optional, defaults otherwise)
// =============================================================================

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trail_channel::market_data::{load_kline_file, BarSeries};
use trail_channel::{ChannelConfig, TrailChannel};

const DEFAULT_CONFIG_PATH: &str = "channel_config.json";

/// Bars kept in memory during replay.
const HISTORY_BARS: usize = 500;

fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("CHANNEL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = ChannelConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        ChannelConfig::default()
    });

    // ── 2. Recorded bars ─────────────────────────────────────────────────
    let bars_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("CHANNEL_BARS_FILE").ok())
        .context("usage: trail-channel <klines.json> (or set CHANNEL_BARS_FILE)")?;
    let bars = load_kline_file(&bars_path)?;

    info!(path = %bars_path, count = bars.len(), channel = %config, "replaying bars");

    // ── 3. Replay ────────────────────────────────────────────────────────
    config.validate()?;
    let mut series = BarSeries::new(HISTORY_BARS.max(config.max_look_back.saturating_mul(2)));
    let mut channel = TrailChannel::new(config)?;

    let mut recomputed = 0usize;
    let mut long_resets = 0usize;
    let mut short_resets = 0usize;

    for bar in bars {
        series.update(bar);
        let report = channel.on_tick(series.bars())?;
        series.mark_scanned();
        recomputed += report.recomputed;

        let Some(current) = series.latest() else {
            continue;
        };
        let time = format_time(current.open_time);

        if let Some(state) = channel.state(current) {
            if state.long_reset {
                long_resets += 1;
                info!(time = %time, level = state.long_trail, "long trail reset");
            }
            if state.short_reset {
                short_resets += 1;
                info!(time = %time, level = state.short_trail, "short trail reset");
            }
        }

        let (long, short) = channel.display(current);
        info!(time = %time, close = current.close, long, short, "channel");
    }

    info!(
        channel = %channel.label(),
        recomputed,
        long_resets,
        short_resets,
        "replay complete"
    );
    Ok(())
}

/// RFC 3339 rendering of a bar open time (ms since epoch).
fn format_time(open_time: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(open_time)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| open_time.to_string())
}
