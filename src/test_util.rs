// src/test_util.rs

use crate::{Bar, EmaPeriod, Interval, Price, PricePeriod, Series, Timestamp};

use chrono::NaiveDate;
use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() < e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

pub(crate) use assert_approx;

pub const TICKER: &str = "AAPL";

pub fn interval() -> Interval {
    Interval::minutes(15)
}

/// Timestamp of the `i`-th 15 minute bar after 2024-01-02 09:30.
pub fn ts(i: usize) -> Timestamp {
    let open = NaiveDate::from_ymd_opt(2024, 1, 2)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid date");
    open + Interval::minutes(15 * i64::try_from(i).expect("small index"))
}

/// Price series of flat bars, one per close, starting at `ts(0)`.
pub fn price_series(closes: &[Price]) -> Series<Bar> {
    Series::with_periods(
        TICKER,
        interval(),
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePeriod::new(ts(i), Bar::flat(close))),
    )
}

/// Scalar series, one value per period, starting at `ts(0)`.
pub fn scalar_series(values: &[Price]) -> Series<Price> {
    Series::with_periods(
        TICKER,
        interval(),
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| EmaPeriod::new(ts(i), value)),
    )
}

/// First `n` periods of `series`.
pub fn prefix<V: Clone>(series: &Series<V>, n: usize) -> Series<V> {
    Series::with_periods(
        series.ticker(),
        series.interval(),
        series.slice(..n).cloned(),
    )
}

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).expect("non zero value")
}
