use std::{
    fmt::{Display, Formatter},
    num::NonZero,
};

use tracing::debug;

use crate::{
    Combine, Crossover, Ema, EmaConfig, Indicator, IndicatorConfig, IndicatorConfigBuilder,
    IndicatorKind, Interval, Notification, Period, Price, PriceSource, Result, Sample, Series,
    Timestamp, ema::extend_combined, period::TIMESTAMP_FORMAT,
};

/// Configuration for the Moving Average Convergence Divergence
/// ([`Macd`]) indicator.
///
/// Defaults to the classic 12/26/9 on closing price.
///
/// # Example
///
/// ```
/// use crossover_ta::{IndicatorConfig, IndicatorConfigBuilder, MacdConfig, PriceSource};
/// use std::num::NonZero;
///
/// let config = MacdConfig::builder()
///     .signal_length(NonZero::new(5).unwrap())
///     .source(PriceSource::HL2)
///     .build();
///
/// assert_eq!(config.fast_length(), 12);
/// assert_eq!(config.slow_length(), 26);
/// assert_eq!(config.signal_length(), 5);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast: NonZero<usize>,
    slow: NonZero<usize>,
    signal: NonZero<usize>,
    source: PriceSource,
}

impl IndicatorConfig for MacdConfig {
    type Builder = MacdConfigBuilder;

    #[inline]
    fn builder() -> Self::Builder {
        MacdConfigBuilder::new()
    }

    #[inline]
    fn source(&self) -> &PriceSource {
        &self.source
    }
}

impl MacdConfig {
    #[inline]
    #[must_use]
    pub fn fast_length(&self) -> usize {
        self.fast.get()
    }

    #[inline]
    #[must_use]
    pub fn slow_length(&self) -> usize {
        self.slow.get()
    }

    #[inline]
    #[must_use]
    pub fn signal_length(&self) -> usize {
        self.signal.get()
    }

    /// MACD(12, 26, 9) on closing price.
    #[must_use]
    pub fn close() -> Self {
        Self::builder().build()
    }

    fn ema(length: NonZero<usize>, source: PriceSource) -> EmaConfig {
        EmaConfig::builder().length(length).source(source).build()
    }
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self::close()
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MacdConfig({}, {}, {}, {})",
            self.fast, self.slow, self.signal, self.source
        )
    }
}

const DEFAULT_FAST: NonZero<usize> = NonZero::new(12).unwrap();
const DEFAULT_SLOW: NonZero<usize> = NonZero::new(26).unwrap();
const DEFAULT_SIGNAL: NonZero<usize> = NonZero::new(9).unwrap();

/// Builder for [`MacdConfig`].
///
/// Defaults: fast = 12, slow = 26, signal = 9,
/// source = [`PriceSource::Close`].
pub struct MacdConfigBuilder {
    fast: NonZero<usize>,
    slow: NonZero<usize>,
    signal: NonZero<usize>,
    source: PriceSource,
}

impl MacdConfigBuilder {
    fn new() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
            source: PriceSource::Close,
        }
    }

    /// Sets the fast EMA length.
    #[inline]
    #[must_use]
    pub fn fast_length(mut self, length: NonZero<usize>) -> Self {
        self.fast = length;
        self
    }

    /// Sets the slow EMA length.
    #[inline]
    #[must_use]
    pub fn slow_length(mut self, length: NonZero<usize>) -> Self {
        self.slow = length;
        self
    }

    /// Sets the signal EMA length.
    #[inline]
    #[must_use]
    pub fn signal_length(mut self, length: NonZero<usize>) -> Self {
        self.signal = length;
        self
    }
}

impl IndicatorConfigBuilder<MacdConfig> for MacdConfigBuilder {
    #[inline]
    fn source(mut self, source: PriceSource) -> Self {
        self.source = source;
        self
    }

    #[inline]
    fn build(self) -> MacdConfig {
        MacdConfig {
            fast: self.fast,
            slow: self.slow,
            signal: self.signal,
            source: self.source,
        }
    }
}

/// MACD output at one timestamp.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct MacdValue {
    /// Fast EMA minus slow EMA.
    pub macd: Price,
    /// EMA of the MACD line.
    pub signal: Price,
    /// `macd - signal`.
    pub histogram: Price,
}

impl MacdValue {
    #[must_use]
    pub fn new(macd: Price, signal: Price) -> Self {
        Self {
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}

impl Display for MacdValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.6}, signal: {:.6}, histogram: {:.6}",
            self.macd, self.signal, self.histogram
        )
    }
}

/// MACD output anchored to a timestamp. Synthesized on access, never
/// stored.
pub type MacdPeriod = Period<MacdValue>;

impl Display for Period<MacdValue> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD at {}: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.value
        )
    }
}

/// Moving Average Convergence Divergence (MACD).
///
/// Owns three [`Ema`]s and two derived series:
///
/// ```text
/// line      = EMA(fast) − EMA(slow)
/// signal    = EMA(signal) over line
/// histogram = line − signal
/// ```
///
/// Each [`extend`](Macd::extend) pushes the source through the fast and
/// slow averages, then appends the new suffix of the line, the signal and
/// the histogram. The histogram is defined from the period where the signal
/// seeds, i.e. after `slow + signal − 1` source periods with the default
/// lengths ordering.
///
/// A subscription watches the histogram for sign changes (crossings of the
/// MACD and signal lines); see [`subscribe`](Macd::subscribe).
#[derive(Debug)]
pub struct Macd {
    config: MacdConfig,
    fast: Ema,
    slow: Ema,
    line: Series<Price>,
    signal: Ema,
    histogram: Series<Price>,
    crossover: Option<Crossover>,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdValue;

    fn new(ticker: impl Into<String>, interval: Interval, config: Self::Config) -> Self {
        let ticker = ticker.into();
        Self {
            config,
            fast: Ema::new(
                ticker.clone(),
                interval,
                MacdConfig::ema(config.fast, config.source),
            ),
            slow: Ema::new(
                ticker.clone(),
                interval,
                MacdConfig::ema(config.slow, config.source),
            ),
            line: Series::new(ticker.clone(), interval),
            signal: Ema::new(
                ticker.clone(),
                interval,
                MacdConfig::ema(config.signal, PriceSource::Close),
            ),
            histogram: Series::new(ticker, interval),
            crossover: None,
        }
    }

    #[inline]
    fn config(&self) -> &MacdConfig {
        &self.config
    }

    /// Returns the number of histogram periods appended.
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedAnchor`](crate::Error::UnresolvedAnchor) if
    /// `source` no longer contains the last timestamp seen,
    /// [`Error::MissingTimestamp`](crate::Error::MissingTimestamp) if the
    /// averages are misaligned, or
    /// [`Error::DegenerateSign`](crate::Error::DegenerateSign) from an active
    /// subscription. Stages completed before the failure keep their new
    /// periods.
    fn extend<V: Sample>(&mut self, source: &Series<V>) -> Result<usize> {
        let before = self.histogram.len();

        self.fast.extend(source)?;
        self.slow.extend(source)?;
        extend_combined(
            &mut self.line,
            self.fast.series(),
            self.slow.series(),
            Combine::Subtract,
        )?;
        self.signal.extend(&self.line)?;
        let appended = extend_combined(
            &mut self.histogram,
            &self.line,
            self.signal.series(),
            Combine::Subtract,
        )?;

        debug!(
            indicator = %self,
            appended,
            total = self.histogram.len(),
            "extended"
        );

        if let Some(crossover) = &mut self.crossover {
            crossover.scan(&self.histogram)?;
        }

        Ok(self.histogram.len() - before)
    }

    #[inline]
    fn value(&self) -> Option<MacdValue> {
        self.at(-1).ok().map(|period| period.value)
    }
}

impl Macd {
    /// MACD output at `timestamp`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingTimestamp`](crate::Error::MissingTimestamp) if the
    /// line or the signal has no period there.
    pub fn get(&self, timestamp: &Timestamp) -> Result<MacdPeriod> {
        let macd = self.line.try_get(timestamp)?.value;
        let signal = self.signal.series().try_get(timestamp)?.value;
        Ok(MacdPeriod::new(*timestamp, MacdValue::new(macd, signal)))
    }

    /// MACD output at a histogram position; negative positions count from
    /// the end.
    ///
    /// # Errors
    ///
    /// [`Error::PositionOutOfRange`](crate::Error::PositionOutOfRange) for
    /// a bad position.
    pub fn at(&self, position: isize) -> Result<MacdPeriod> {
        let timestamp = self.histogram.try_at(position)?.timestamp;
        self.get(&timestamp)
    }

    /// Synthesized outputs in ascending timestamp order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Result<MacdPeriod>> + '_ {
        self.histogram.iter().map(|p| self.get(&p.timestamp))
    }

    /// Number of periods with a full MACD output.
    #[must_use]
    pub fn len(&self) -> usize {
        self.histogram.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    #[must_use]
    pub fn fast(&self) -> &Ema {
        &self.fast
    }

    #[must_use]
    pub fn slow(&self) -> &Ema {
        &self.slow
    }

    #[must_use]
    pub fn signal(&self) -> &Ema {
        &self.signal
    }

    /// Fast minus slow average.
    #[must_use]
    pub fn line(&self) -> &Series<Price> {
        &self.line
    }

    /// Line minus signal.
    #[must_use]
    pub fn histogram(&self) -> &Series<Price> {
        &self.histogram
    }

    /// Watches the histogram for sign changes, replacing any previous
    /// subscription.
    ///
    /// Periods already computed are scanned right away, so `callback` may
    /// fire before this returns. Returns the number of notifications fired.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateSign`](crate::Error::DegenerateSign) if a scanned
    /// histogram value is exactly zero.
    pub fn subscribe(&mut self, callback: impl FnMut(Notification) + 'static) -> Result<usize> {
        self.crossover
            .insert(Crossover::new(IndicatorKind::Macd, 0.0, callback))
            .scan(&self.histogram)
    }

    /// Drops the active subscription, if any.
    pub fn unsubscribe(&mut self) {
        self.crossover = None;
    }

    #[must_use]
    pub fn crossover(&self) -> Option<&Crossover> {
        self.crossover.as_ref()
    }
}

impl Display for Macd {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {}, {}) for {}",
            self.config.fast,
            self.config.slow,
            self.config.signal,
            self.config.source,
            self.histogram.ticker()
        )
    }
}
