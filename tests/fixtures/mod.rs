#![allow(dead_code)]

use chrono::NaiveDateTime;
use crossover_ta::{Bar, PricePeriod, Series, Timestamp};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

pub const TICKER: &str = "AAPL";

/// OHLCV bar parsed from the 15 minute CSV export.
#[derive(Debug, Clone, Deserialize)]
pub struct RefBar {
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl From<&RefBar> for PricePeriod {
    fn from(bar: &RefBar) -> Self {
        PricePeriod::new(
            bar.timestamp,
            Bar::new(bar.open, bar.high, bar.low, bar.close, bar.volume),
        )
    }
}

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: Timestamp,
    pub expected: f64,
}

/// Reference MACD value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefMacdValue {
    #[serde(deserialize_with = "timestamp")]
    pub timestamp: Timestamp,
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/aapl-15min.csv";

/// Load reference bars.
pub fn load_reference_bars() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Reference bars as a price series.
pub fn load_reference_series() -> Series<Bar> {
    let bars = load_reference_bars();
    bars_to_series(&bars)
}

pub fn bars_to_series(bars: &[RefBar]) -> Series<Bar> {
    Series::with_periods(
        TICKER,
        chrono::TimeDelta::minutes(15),
        bars.iter().map(PricePeriod::from),
    )
}

/// Load single-value reference data (EMA).
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Load MACD reference data (line, signal, histogram).
pub fn load_macd_ref(path: &str) -> Vec<RefMacdValue> {
    load_records(path, "invalid MACD reference record")
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Growing prefixes of `bars`, `step` bars apart, ending with all of them.
///
/// Simulates a provider returning a longer history window on every poll.
pub fn refresh_snapshots(bars: &[RefBar], step: usize) -> Vec<Series<Bar>> {
    let mut ends: Vec<_> = (step..bars.len()).step_by(step).collect();
    ends.push(bars.len());
    ends.into_iter().map(|end| bars_to_series(&bars[..end])).collect()
}

fn timestamp<'de, D>(deserializer: D) -> Result<Timestamp, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").map_err(serde::de::Error::custom)
}

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
