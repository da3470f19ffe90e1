use std::{
    fmt::{Debug, Display},
    num::NonZero,
};

use tracing::{debug, warn};

use crate::{
    Crossover, EmaPeriod, Error, Indicator, IndicatorConfig, IndicatorConfigBuilder,
    IndicatorKind, Interval, Notification, Price, PriceSource, Result, Sample, Series,
};

/// Configuration for the Exponential Moving Average ([`Ema`])
/// indicator.
///
/// # Example
///
/// ```
/// use crossover_ta::{EmaConfig, IndicatorConfig, IndicatorConfigBuilder};
/// use std::num::NonZero;
///
/// let config = EmaConfig::builder()
///     .length(NonZero::new(20).unwrap())
///     .build();
///
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.multiplier(), 2.0 / 21.0);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for EmaConfig {
    type Builder = EmaConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        EmaConfigBuilder::new()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl EmaConfig {
    /// Window length (number of periods).
    #[inline]
    #[must_use]
    pub fn length(&self) -> usize {
        self.length
    }

    /// Smoothing factor `2 / (length + 1)`.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn multiplier(&self) -> f64 {
        2.0 / (self.length + 1) as f64
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::builder().length(length).build()
    }

    /// EMA on median price: `(high + low) / 2`.
    #[must_use]
    pub fn hl2(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::HL2)
            .build()
    }

    /// EMA on average price: `(open + high + low + close) / 4`.
    #[must_use]
    pub fn ohlc4(length: NonZero<usize>) -> Self {
        Self::builder()
            .length(length)
            .source(PriceSource::OHLC4)
            .build()
    }

    /// EMA over a scalar series (another average, the MACD line).
    #[must_use]
    pub fn value(length: NonZero<usize>) -> Self {
        Self::close(length)
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Builder for [`EmaConfig`].
///
/// Defaults: source = [`PriceSource::Close`].
/// Length must be set before calling
/// [`build`](IndicatorConfigBuilder::build).
pub struct EmaConfigBuilder {
    length: Option<usize>,
    source: PriceSource,
}

impl EmaConfigBuilder {
    fn new() -> Self {
        Self {
            length: None,
            source: PriceSource::Close,
        }
    }

    /// Sets the indicator window length.
    #[inline]
    #[must_use]
    pub fn length(mut self, length: NonZero<usize>) -> Self {
        self.length.replace(length.get());
        self
    }
}

impl IndicatorConfigBuilder<EmaConfig> for EmaConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> EmaConfig {
        EmaConfig {
            length: self.length.expect("length is required"),
            source: self.source,
        }
    }
}

/// Binary operator applied to two aligned scalar series.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Combine {
    Add,
    Subtract,
}

/// Applies `op` to a pair of values.
#[inline]
#[must_use]
pub fn combine_values(lhs: Price, rhs: Price, op: Combine) -> Price {
    match op {
        Combine::Add => lhs + rhs,
        Combine::Subtract => lhs - rhs,
    }
}

/// Combines two scalar series timestamp by timestamp.
///
/// Walks the timestamps of the shorter operand (`rhs` on a tie) and looks
/// each one up in both operands. The result carries `lhs`'s ticker and
/// interval.
///
/// # Errors
///
/// [`Error::MissingTimestamp`] when a timestamp of the shorter operand is
/// absent from the longer one.
pub fn combine(lhs: &Series<Price>, rhs: &Series<Price>, op: Combine) -> Result<Series<Price>> {
    let mut combined = Series::new(lhs.ticker(), lhs.interval());
    extend_combined(&mut combined, lhs, rhs, op)?;
    Ok(combined)
}

/// Appends to `target` the combined values for timestamps of the shorter
/// operand that lie past `target`'s latest period.
pub(crate) fn extend_combined(
    target: &mut Series<Price>,
    lhs: &Series<Price>,
    rhs: &Series<Price>,
    op: Combine,
) -> Result<usize> {
    let shorter = if lhs.len() < rhs.len() { lhs } else { rhs };
    let start = match target.latest() {
        Some(last) => shorter
            .position(&last.timestamp)
            .ok_or(Error::UnresolvedAnchor(last.timestamp))?
            + 1,
        None => 0,
    };

    let mut appended = 0;
    for timestamp in shorter.timestamps().skip(start) {
        let value = combine_values(
            lhs.try_get(timestamp)?.value,
            rhs.try_get(timestamp)?.value,
            op,
        );
        target.insert(EmaPeriod::new(*timestamp, value));
        appended += 1;
    }
    Ok(appended)
}

/// Exponential Moving Average (EMA) series.
///
/// Uses the standard smoothing factor `α = 2 / (length + 1)`. Each value
/// is computed as:
///
/// ```text
/// EMA = (price − prev_EMA) × α + prev_EMA
/// ```
///
/// The first value is the SMA of the first `length` source periods,
/// anchored at the timestamp of the `length`-th one. Later calls to
/// [`extend`](Ema::extend) resume right after the last computed timestamp,
/// so the cost of a refresh is proportional to the number of new source
/// periods only.
///
/// An optional subscription watches the series for crossings of a
/// threshold; see [`subscribe`](Ema::subscribe).
///
/// # Example
///
/// ```
/// use crossover_ta::{Ema, EmaConfig, Series, EmaPeriod};
/// use chrono::{NaiveDate, TimeDelta};
/// use std::num::NonZero;
///
/// let t0 = NaiveDate::from_ymd_opt(2024, 1, 2)
///     .unwrap()
///     .and_hms_opt(9, 30, 0)
///     .unwrap();
/// let interval = TimeDelta::minutes(15);
/// let source = Series::with_periods(
///     "AAPL",
///     interval,
///     [2.0, 4.0, 6.0, 8.0]
///         .into_iter()
///         .enumerate()
///         .map(|(i, v)| EmaPeriod::new(t0 + interval * i as i32, v)),
/// );
///
/// let ema = Ema::from_series(&source, EmaConfig::value(NonZero::new(3).unwrap())).unwrap();
///
/// // SMA seed = (2 + 4 + 6) / 3 = 4.0, then 8 × 0.5 + 4 × 0.5 = 6.0
/// assert_eq!(ema.series().at(0).unwrap().value, 4.0);
/// assert_eq!(ema.value(), Some(6.0));
/// ```
#[derive(Debug)]
pub struct Ema {
    config: EmaConfig,
    alpha: f64,
    series: Series<Price>,
    crossover: Option<Crossover>,
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(ticker: impl Into<String>, interval: Interval, config: Self::Config) -> Self {
        Self {
            config,
            alpha: config.multiplier(),
            series: Series::new(ticker, interval),
            crossover: None,
        }
    }

    #[inline]
    fn config(&self) -> &EmaConfig {
        &self.config
    }

    /// # Errors
    ///
    /// [`Error::UnresolvedAnchor`] if the last computed timestamp is not in
    /// `source` (nothing is appended), or [`Error::DegenerateSign`] from an
    /// active subscription (the new periods stay appended).
    fn extend<V: Sample>(&mut self, source: &Series<V>) -> Result<usize> {
        let mut appended = 0;

        let start = if let Some(last) = self.series.latest() {
            let anchor = last.timestamp;
            let Some(position) = source.position(&anchor) else {
                warn!(indicator = %self, %anchor, "anchor missing from source series");
                return Err(Error::UnresolvedAnchor(anchor));
            };
            position + 1
        } else {
            let length = self.config.length;
            if source.len() < length {
                debug!(
                    indicator = %self,
                    available = source.len(),
                    required = length,
                    "not enough periods to seed"
                );
                return Ok(0);
            }
            self.seed(source);
            appended += 1;
            length
        };

        let Some(mut ema) = self.series.latest().map(|p| p.value) else {
            return Ok(appended);
        };

        for period in source.slice(start..) {
            let price = period.value.sample(self.config.source);
            ema = self.alpha.mul_add(price - ema, ema);
            self.series.insert(EmaPeriod::new(period.timestamp, ema));
            appended += 1;
        }

        debug!(
            indicator = %self,
            appended,
            total = self.series.len(),
            "extended"
        );

        if let Some(crossover) = &mut self.crossover {
            crossover.scan(&self.series)?;
        }

        Ok(appended)
    }

    #[inline]
    fn value(&self) -> Option<Price> {
        self.series.latest().map(|p| p.value)
    }
}

impl Ema {
    /// Computed averages, ascending by timestamp.
    #[must_use]
    pub fn series(&self) -> &Series<Price> {
        &self.series
    }

    /// Watches the series for crossings of `threshold`, replacing any
    /// previous subscription.
    ///
    /// Periods already computed are scanned right away, so `callback` may
    /// fire before this returns. Returns the number of notifications fired.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateSign`] if a scanned value equals `threshold`.
    pub fn subscribe(
        &mut self,
        threshold: Price,
        callback: impl FnMut(Notification) + 'static,
    ) -> Result<usize> {
        self.crossover
            .insert(Crossover::new(IndicatorKind::Ema, threshold, callback))
            .scan(&self.series)
    }

    /// Drops the active subscription, if any.
    pub fn unsubscribe(&mut self) {
        self.crossover = None;
    }

    #[must_use]
    pub fn crossover(&self) -> Option<&Crossover> {
        self.crossover.as_ref()
    }

    /// Combines this average with `other`; see [`combine`].
    ///
    /// # Errors
    ///
    /// [`Error::MissingTimestamp`] when the two series are not aligned.
    pub fn combine(&self, other: &Ema, op: Combine) -> Result<Series<Price>> {
        combine(&self.series, &other.series, op)
    }

    fn seed<V: Sample>(&mut self, source: &Series<V>) {
        let length = self.config.length;
        let mut sum = 0.0;
        let mut anchor = None;

        for period in source.slice(..length) {
            sum += period.value.sample(self.config.source);
            anchor = Some(period.timestamp);
        }

        if let Some(anchor) = anchor {
            #[allow(clippy::cast_precision_loss)]
            let seed = sum / length as f64;
            debug!(indicator = %self, %anchor, seed, "seeded");
            self.series.insert(EmaPeriod::new(anchor, seed));
        }
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "EMA({}, {}) for {}",
            self.config.length,
            self.config.source,
            self.series.ticker()
        )
    }
}
