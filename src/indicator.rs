use crate::{Interval, PriceSource, Result, Sample, Series};

use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters
/// (lengths, price source). Configs are value types: cheap to copy,
/// compare, and hash. An indicator is bound to its config for life.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Eq + Hash + Display + Debug {
    /// Builder type for constructing this config.
    type Builder: IndicatorConfigBuilder<Self>;

    /// Returns a new builder with default values.
    fn builder() -> Self::Builder;

    /// Price source to extract from each bar.
    fn source(&self) -> &PriceSource;
}

/// Builder for an [`IndicatorConfig`].
pub trait IndicatorConfigBuilder<Config>
where
    Config: IndicatorConfig,
{
    /// Sets the price source.
    #[must_use]
    fn source(self, source: PriceSource) -> Self;

    /// Builds the config. Panics if required fields are missing.
    #[must_use]
    fn build(self) -> Config;
}

/// An incrementally extended indicator series.
///
/// Indicators own the series they compute and grow it in place: each call
/// to [`extend`](Indicator::extend) is handed the full (possibly longer)
/// upstream series and computes only the periods past the last one it has
/// already produced.
///
/// # Example
///
/// ```
/// use crossover_ta::{Bar, Ema, EmaConfig, Indicator, PricePeriod, Series};
/// use chrono::{NaiveDate, TimeDelta};
/// use std::num::NonZero;
///
/// let t0 = NaiveDate::from_ymd_opt(2024, 1, 2)
///     .unwrap()
///     .and_hms_opt(9, 30, 0)
///     .unwrap();
/// let interval = TimeDelta::minutes(15);
/// let mut prices = Series::new("AAPL", interval);
/// for (i, close) in [10.0, 20.0, 30.0].into_iter().enumerate() {
///     prices.insert(PricePeriod::new(t0 + interval * i as i32, Bar::flat(close)));
/// }
///
/// let mut ema = Ema::new("AAPL", interval, EmaConfig::close(NonZero::new(3).unwrap()));
/// assert_eq!(ema.extend(&prices).unwrap(), 1);
/// assert_eq!(ema.value(), Some(20.0));
/// ```
pub trait Indicator: Sized + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Value type of the latest period. `f64` for simple indicators,
    /// a struct for composite ones (e.g. MACD).
    type Output: Display + Debug;

    /// Creates an empty indicator for the given ticker and interval.
    fn new(ticker: impl Into<String>, interval: Interval, config: Self::Config) -> Self;

    /// Creates an indicator bound to `source`'s ticker and interval and
    /// extends it once with `source`.
    ///
    /// # Errors
    ///
    /// Whatever the first [`extend`](Indicator::extend) reports.
    fn from_series<V: Sample>(source: &Series<V>, config: Self::Config) -> Result<Self> {
        let mut indicator = Self::new(source.ticker(), source.interval(), config);
        indicator.extend(source)?;
        Ok(indicator)
    }

    /// The config this indicator was created with.
    fn config(&self) -> &Self::Config;

    /// Computes the periods of `source` not seen yet and returns how many
    /// periods were appended.
    ///
    /// # Errors
    ///
    /// See the implementing indicator.
    fn extend<V: Sample>(&mut self, source: &Series<V>) -> Result<usize>;

    /// Value of the latest computed period, or `None` while empty.
    fn value(&self) -> Option<Self::Output>;
}
