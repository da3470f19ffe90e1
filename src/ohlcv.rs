use chrono::{NaiveDateTime, TimeDelta};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar open timestamp.
///
/// Unique key of a period within a [`Series`](crate::Series). Naive local
/// time, as delivered by intraday market-data feeds.
pub type Timestamp = NaiveDateTime;

/// Fixed sampling interval of a series (e.g. 15 minutes).
pub type Interval = TimeDelta;

/// OHLCV bar data used as input to all indicators.
///
/// Implement this on your own kline/candle type to reuse
/// [`PriceSource`](crate::PriceSource) extraction.
///
/// # Example
///
/// ```
/// use crossover_ta::{Ohlcv, Price};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Trade volume during the bar. Defaults to `0.0`.
    fn volume(&self) -> f64 {
        0.0
    }
}

/// Price payload of a [`PricePeriod`](crate::PricePeriod).
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Bar {
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
}

impl Bar {
    #[must_use]
    pub fn new(open: Price, high: Price, low: Price, close: Price, volume: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Bar with all four prices equal to `close` and no volume.
    #[must_use]
    pub fn flat(close: Price) -> Self {
        Self::new(close, close, close, close, 0.0)
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn volume(&self) -> f64 {
        self.volume
    }
}
