pub mod bar_series;

// Re-export the Bar struct for convenient access (e.g. `use crate::market_data::Bar`).
pub use bar_series::{load_kline_file, parse_kline_rows, Bar, BarSeries};
