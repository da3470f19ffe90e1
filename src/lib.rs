//! Incremental EMA and MACD indicators with crossover notifications.
//!
//! Price bars are stored in a [`Series`], a time-ordered collection keyed
//! by bar timestamp. Indicators own the series they compute and are
//! [extended](Ema::extend) with the full, possibly longer, price series on
//! every refresh: only periods past the last computed timestamp are
//! evaluated, and earlier values are never rewritten.
//!
//! Each indicator type ([`Ema`], [`Macd`]) exposes [`new`](Ema::new),
//! [`from_series`](Ema::from_series), [`extend`](Ema::extend), and
//! [`value`](Ema::value) as inherent methods, so no trait import is
//! needed. Import [`Indicator`] only for generic code.
//!
//! Subscribers are notified through a callback whenever the monitored value
//! changes sign relative to a threshold: an EMA crossing a price level, or
//! the MACD line crossing its signal line (histogram changing sign).
//!
//! The crate emits [`tracing`] events and installs no subscriber.

mod crossover;
mod ema;
mod error;
mod indicator;
mod macd;
mod ohlcv;
mod period;
mod price_source;
mod series;
mod ticker;

pub use crate::error::{Error, Result};
pub use crate::indicator::{Indicator, IndicatorConfig, IndicatorConfigBuilder};
pub use crate::ohlcv::{Bar, Interval, Ohlcv, Price, Timestamp};
pub use crate::period::{EmaPeriod, Period, PricePeriod};
pub use crate::price_source::{PriceSource, Sample};
pub use crate::series::Series;

pub use crate::crossover::{Callback, Crossover, IndicatorKind, Notification, Sign};
pub use crate::ema::{Combine, Ema, EmaConfig, EmaConfigBuilder, combine, combine_values};
pub use crate::macd::{Macd, MacdConfig, MacdConfigBuilder, MacdPeriod, MacdValue};
pub use crate::ticker::{BarSource, ReplayError, ReplaySource, Ticker};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(ticker: impl Into<String>, interval: Interval, config: $config) -> Self {
                <Self as Indicator>::new(ticker, interval, config)
            }

            /// See [`Indicator::from_series`].
            ///
            /// # Errors
            ///
            /// See [`extend`](Self::extend).
            pub fn from_series<V: Sample>(source: &Series<V>, config: $config) -> Result<Self> {
                <Self as Indicator>::from_series(source, config)
            }

            /// See [`Indicator::extend`].
            ///
            /// # Errors
            ///
            /// See [`Indicator::extend`] on this type.
            #[inline]
            pub fn extend<V: Sample>(&mut self, source: &Series<V>) -> Result<usize> {
                <Self as Indicator>::extend(self, source)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(Macd, MacdConfig, MacdValue);

#[cfg(test)]
mod test_util;
