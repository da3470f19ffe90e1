use crate::{Bar, Error, Interval, Result, Series};

use std::fmt::{Display, Formatter};
use tracing::debug;

/// Provider of price bars for a ticker and sampling interval.
///
/// Every fetch returns a snapshot: the bars the provider currently has,
/// already parsed. Snapshots may overlap previous ones; [`Ticker::refresh`]
/// keeps only the timestamps it has not stored yet.
///
/// Closures of the right shape are sources too:
///
/// ```
/// use crossover_ta::{Bar, Interval, Result, Series, Ticker};
///
/// let mut source = |ticker: &str, interval: Interval| -> Result<Series<Bar>> {
///     Ok(Series::new(ticker, interval))
/// };
///
/// let mut ticker = Ticker::with_default_interval("AAPL");
/// assert_eq!(ticker.refresh(&mut source).unwrap(), 0);
/// ```
pub trait BarSource {
    /// Fetches the bars currently available.
    ///
    /// # Errors
    ///
    /// [`Error::Source`] wrapping whatever the provider reports.
    fn fetch(&mut self, ticker: &str, interval: Interval) -> Result<Series<Bar>>;
}

impl<F> BarSource for F
where
    F: FnMut(&str, Interval) -> Result<Series<Bar>>,
{
    fn fetch(&mut self, ticker: &str, interval: Interval) -> Result<Series<Bar>> {
        self(ticker, interval)
    }
}

/// Failures of a [`ReplaySource`], reported through [`Error::Source`].
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("replay holds {held} bars, {requested} was requested")]
    TickerMismatch { held: String, requested: String },

    #[error("replay holds {held} bars, {requested} was requested")]
    IntervalMismatch { held: Interval, requested: Interval },
}

impl From<ReplayError> for Error {
    fn from(err: ReplayError) -> Self {
        Self::Source(Box::new(err))
    }
}

/// Replays a recorded price series, revealing `step` more bars on every
/// fetch until all of it is visible.
///
/// Each fetch returns the whole revealed prefix, the way a live provider
/// returns its full history window.
#[derive(Clone, Debug)]
pub struct ReplaySource {
    bars: Series<Bar>,
    step: usize,
    revealed: usize,
}

impl ReplaySource {
    #[must_use]
    pub fn new(bars: Series<Bar>, step: std::num::NonZero<usize>) -> Self {
        Self {
            bars,
            step: step.get(),
            revealed: 0,
        }
    }

    /// Replays the whole series on the first fetch.
    #[must_use]
    pub fn all_at_once(bars: Series<Bar>) -> Self {
        let step = bars.len().max(1);
        Self {
            bars,
            step,
            revealed: 0,
        }
    }

    /// Number of bars handed out by the latest fetch.
    #[must_use]
    pub fn revealed(&self) -> usize {
        self.revealed
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.revealed >= self.bars.len()
    }
}

impl BarSource for ReplaySource {
    fn fetch(&mut self, ticker: &str, interval: Interval) -> Result<Series<Bar>> {
        if ticker != self.bars.ticker() {
            return Err(ReplayError::TickerMismatch {
                held: self.bars.ticker().to_owned(),
                requested: ticker.to_owned(),
            }
            .into());
        }
        if interval != self.bars.interval() {
            return Err(ReplayError::IntervalMismatch {
                held: self.bars.interval(),
                requested: interval,
            }
            .into());
        }

        self.revealed = (self.revealed + self.step).min(self.bars.len());
        Ok(Series::with_periods(
            ticker,
            interval,
            self.bars.slice(..self.revealed).cloned(),
        ))
    }
}

/// A symbol, its sampling interval and the price bars gathered so far.
///
/// Bars only accumulate: a refresh adds the timestamps not seen before and
/// never rewrites a stored bar, so indicators extended from
/// [`prices`](Ticker::prices) can always find their anchor again.
///
/// # Example
///
/// ```
/// use crossover_ta::{Ema, EmaConfig, ReplaySource, Ticker};
/// # use crossover_ta::{Bar, PricePeriod, Series};
/// # use chrono::{NaiveDate, TimeDelta};
/// use std::num::NonZero;
///
/// # let t0 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(9, 30, 0).unwrap();
/// # let interval = TimeDelta::minutes(15);
/// # let recorded = Series::with_periods("AAPL", interval, (0..10).map(|i| {
/// #     PricePeriod::new(t0 + interval * i, Bar::flat(f64::from(i)))
/// # }));
/// let mut source = ReplaySource::new(recorded, NonZero::new(4).unwrap());
/// let mut ticker = Ticker::with_default_interval("AAPL");
/// let mut ema = Ema::new("AAPL", ticker.interval(), EmaConfig::close(NonZero::new(3).unwrap()));
///
/// while !source.is_exhausted() {
///     ticker.refresh(&mut source).unwrap();
///     ema.extend(ticker.prices()).unwrap();
/// }
/// assert_eq!(ema.series().len(), 8);
/// ```
#[derive(Clone, Debug)]
pub struct Ticker {
    prices: Series<Bar>,
}

impl Ticker {
    #[must_use]
    pub fn new(symbol: impl Into<String>, interval: Interval) -> Self {
        Self {
            prices: Series::new(symbol, interval),
        }
    }

    /// Ticker sampled every 15 minutes.
    #[must_use]
    pub fn with_default_interval(symbol: impl Into<String>) -> Self {
        Self::new(symbol, Interval::minutes(15))
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        self.prices.ticker()
    }

    #[must_use]
    pub fn interval(&self) -> Interval {
        self.prices.interval()
    }

    #[must_use]
    pub fn prices(&self) -> &Series<Bar> {
        &self.prices
    }

    /// Fetches a snapshot from `source` and merges it into the stored
    /// prices. Returns the number of new bars.
    ///
    /// # Errors
    ///
    /// Whatever `source` reports; the stored prices are left untouched.
    pub fn refresh(&mut self, source: &mut impl BarSource) -> Result<usize> {
        let snapshot = source.fetch(self.symbol(), self.interval())?;
        let added = self.prices.merge(&snapshot);

        debug!(
            ticker = self.symbol(),
            fetched = snapshot.len(),
            added,
            total = self.prices.len(),
            "refreshed"
        );

        Ok(added)
    }
}

impl Display for Ticker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} every {} min",
            self.symbol(),
            self.interval().num_minutes()
        )
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::crossover::tests::recorder;
    use crate::test_util::{TICKER, interval, nz, price_series, ts};
    use crate::{Ema, EmaConfig, Macd, MacdConfig, PricePeriod};

    fn wave(n: usize) -> Series<Bar> {
        let closes: Vec<_> = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let x = i as f64 / 4.0;
                50.0 + 5.0 * x.cos()
            })
            .collect();
        price_series(&closes)
    }

    mod replay {
        use super::*;

        #[test]
        fn reveals_step_bars_per_fetch() {
            let mut source = ReplaySource::new(price_series(&[1.0, 2.0, 3.0, 4.0, 5.0]), nz(2));

            let first = source.fetch(TICKER, interval()).unwrap();
            assert_eq!(first.len(), 2);
            assert_eq!(first.latest().unwrap().timestamp, ts(1));

            source.fetch(TICKER, interval()).unwrap();
            let last = source.fetch(TICKER, interval()).unwrap();
            assert_eq!(last.len(), 5);
            assert!(source.is_exhausted());

            assert_eq!(source.fetch(TICKER, interval()).unwrap().len(), 5);
        }

        #[test]
        fn all_at_once() {
            let mut source = ReplaySource::all_at_once(price_series(&[1.0, 2.0, 3.0]));
            assert_eq!(source.fetch(TICKER, interval()).unwrap().len(), 3);
            assert_eq!(source.revealed(), 3);
        }

        #[test]
        fn rejects_other_ticker() {
            let mut source = ReplaySource::all_at_once(price_series(&[1.0]));
            let err = source.fetch("MSFT", interval()).unwrap_err();
            assert!(matches!(err, Error::Source(_)));
            assert_eq!(
                err.to_string(),
                "bar source failed: replay holds AAPL bars, MSFT was requested"
            );
        }

        #[test]
        fn rejects_other_interval() {
            let mut source = ReplaySource::all_at_once(price_series(&[1.0]));
            let err = source.fetch(TICKER, Interval::hours(1)).unwrap_err();
            assert!(matches!(err, Error::Source(_)));
            assert_eq!(source.revealed(), 0);
        }
    }

    mod refresh {
        use super::*;

        #[test]
        fn merges_new_bars_only() {
            let mut source = ReplaySource::new(wave(10), nz(4));
            let mut ticker = Ticker::new(TICKER, interval());

            assert_eq!(ticker.refresh(&mut source).unwrap(), 4);
            assert_eq!(ticker.refresh(&mut source).unwrap(), 4);
            assert_eq!(ticker.refresh(&mut source).unwrap(), 2);
            assert_eq!(ticker.refresh(&mut source).unwrap(), 0);
            assert_eq!(*ticker.prices(), wave(10));
        }

        #[test]
        fn keeps_stored_bars() {
            let revised = Series::with_periods(
                TICKER,
                interval(),
                [
                    PricePeriod::new(ts(0), Bar::flat(99.0)),
                    PricePeriod::new(ts(1), Bar::flat(2.0)),
                ],
            );
            let mut ticker = Ticker::new(TICKER, interval());
            ticker
                .refresh(&mut ReplaySource::all_at_once(price_series(&[1.0])))
                .unwrap();

            assert_eq!(
                ticker
                    .refresh(&mut ReplaySource::all_at_once(revised))
                    .unwrap(),
                1
            );
            assert_eq!(ticker.prices().at(0).unwrap().value.close, 1.0);
            assert_eq!(ticker.prices().at(1).unwrap().value.close, 2.0);
        }

        #[test]
        fn failed_fetch_leaves_prices() {
            let mut ticker = Ticker::new(TICKER, interval());
            ticker
                .refresh(&mut ReplaySource::all_at_once(price_series(&[1.0, 2.0])))
                .unwrap();

            let mut failing = |_: &str, _: Interval| -> Result<Series<Bar>> {
                Err(Error::Source("connection reset".into()))
            };
            assert!(ticker.refresh(&mut failing).is_err());
            assert_eq!(ticker.prices().len(), 2);
        }

        #[test]
        fn closure_source() {
            let mut calls = 0;
            let mut source = |ticker: &str, interval: Interval| -> Result<Series<Bar>> {
                calls += 1;
                assert_eq!(ticker, TICKER);
                Ok(Series::with_periods(
                    ticker,
                    interval,
                    [PricePeriod::new(ts(calls), Bar::flat(1.0))],
                ))
            };

            let mut ticker = Ticker::new(TICKER, interval());
            ticker.refresh(&mut source).unwrap();
            ticker.refresh(&mut source).unwrap();
            assert_eq!(ticker.prices().len(), 2);
        }
    }

    mod pipeline {
        use super::*;

        #[test]
        fn indicators_follow_refreshes() {
            let recorded = wave(120);
            let mut source = ReplaySource::new(recorded.clone(), nz(7));
            let mut ticker = Ticker::new(TICKER, interval());

            let mut ema = Ema::new(TICKER, interval(), EmaConfig::close(nz(12)));
            let mut macd = Macd::new(TICKER, interval(), MacdConfig::default());
            let (ema_seen, callback) = recorder();
            ema.subscribe(50.0, callback).unwrap();
            let (macd_seen, callback) = recorder();
            macd.subscribe(callback).unwrap();

            while !source.is_exhausted() {
                ticker.refresh(&mut source).unwrap();
                ema.extend(ticker.prices()).unwrap();
                macd.extend(ticker.prices()).unwrap();
            }

            let ema_once = Ema::from_series(&recorded, EmaConfig::close(nz(12))).unwrap();
            let macd_once = Macd::from_series(&recorded, MacdConfig::default()).unwrap();
            assert_eq!(ema.series(), ema_once.series());
            assert_eq!(macd.histogram(), macd_once.histogram());

            assert!(!ema_seen.borrow().is_empty());
            assert!(!macd_seen.borrow().is_empty());
        }
    }

    #[test]
    fn display() {
        assert_eq!(
            Ticker::with_default_interval("MSFT").to_string(),
            "MSFT every 15 min"
        );
    }
}
