use crate::{Error, Interval, Period, Result, Timestamp};

use indexmap::IndexMap;
use std::{
    fmt::{Display, Formatter},
    ops::{Bound, RangeBounds},
};

/// Time-ordered collection of periods keyed by unique timestamps.
///
/// A series belongs to one ticker and one sampling interval. Periods are
/// kept in strictly ascending timestamp order after every mutation, so
/// positional access ([`at`](Self::at), [`slice`](Self::slice)) and keyed
/// access ([`get`](Self::get)) are always consistent with each other.
///
/// Series grow by [`merge`](Self::merge), which never overwrites a
/// timestamp it already holds. Re-merging the same snapshot is a no-op.
///
/// # Example
///
/// ```
/// use crossover_ta::{Bar, PricePeriod, Series};
/// use chrono::{NaiveDate, TimeDelta};
///
/// let t0 = NaiveDate::from_ymd_opt(2024, 1, 2)
///     .unwrap()
///     .and_hms_opt(9, 30, 0)
///     .unwrap();
/// let interval = TimeDelta::minutes(15);
///
/// let mut series = Series::new("AAPL", interval);
/// series.insert(PricePeriod::new(t0 + interval, Bar::flat(11.0)));
/// series.insert(PricePeriod::new(t0, Bar::flat(10.0)));
///
/// assert_eq!(series.earliest().unwrap().value.close, 10.0);
/// assert_eq!(series.at(-1).unwrap().value.close, 11.0);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Series<V> {
    ticker: String,
    interval: Interval,
    periods: IndexMap<Timestamp, Period<V>>,
}

impl<V> Series<V> {
    /// Creates an empty series.
    #[must_use]
    pub fn new(ticker: impl Into<String>, interval: Interval) -> Self {
        Self {
            ticker: ticker.into(),
            interval,
            periods: IndexMap::new(),
        }
    }

    /// Creates a series from periods in any order. A later period replaces
    /// an earlier one with the same timestamp.
    #[must_use]
    pub fn with_periods(
        ticker: impl Into<String>,
        interval: Interval,
        periods: impl IntoIterator<Item = Period<V>>,
    ) -> Self {
        let mut series = Self::new(ticker, interval);
        for period in periods {
            series.insert(period);
        }
        series
    }

    #[must_use]
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    #[must_use]
    pub fn interval(&self) -> Interval {
        self.interval
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    #[must_use]
    pub fn contains(&self, timestamp: &Timestamp) -> bool {
        self.periods.contains_key(timestamp)
    }

    /// Sorted position of `timestamp`, if present.
    #[must_use]
    pub fn position(&self, timestamp: &Timestamp) -> Option<usize> {
        self.periods.get_index_of(timestamp)
    }

    /// Period keyed by `timestamp`.
    #[must_use]
    pub fn get(&self, timestamp: &Timestamp) -> Option<&Period<V>> {
        self.periods.get(timestamp)
    }

    /// Like [`get`](Self::get), reporting an absent timestamp as
    /// [`Error::MissingTimestamp`].
    pub fn try_get(&self, timestamp: &Timestamp) -> Result<&Period<V>> {
        self.get(timestamp)
            .ok_or(Error::MissingTimestamp(*timestamp))
    }

    /// Period at a sorted position. Negative positions count from the end:
    /// `-1` is the latest period.
    #[must_use]
    pub fn at(&self, position: isize) -> Option<&Period<V>> {
        self.resolve(position)
            .and_then(|index| self.periods.get_index(index))
            .map(|(_, period)| period)
    }

    /// Like [`at`](Self::at), reporting a bad position as
    /// [`Error::PositionOutOfRange`].
    pub fn try_at(&self, position: isize) -> Result<&Period<V>> {
        self.at(position).ok_or(Error::PositionOutOfRange {
            position,
            len: self.len(),
        })
    }

    /// Periods in a range of sorted positions. Bounds past the end are
    /// clamped; open bounds cover the whole series.
    pub fn slice<R>(
        &self,
        range: R,
    ) -> impl DoubleEndedIterator<Item = &Period<V>> + ExactSizeIterator
    where
        R: RangeBounds<usize>,
    {
        let len = self.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);

        self.periods.values().skip(start).take(end - start)
    }

    /// Period with the smallest timestamp.
    #[must_use]
    pub fn earliest(&self) -> Option<&Period<V>> {
        self.periods.first().map(|(_, period)| period)
    }

    /// Period with the largest timestamp.
    #[must_use]
    pub fn latest(&self) -> Option<&Period<V>> {
        self.periods.last().map(|(_, period)| period)
    }

    /// Periods in ascending timestamp order. Each call starts a fresh,
    /// independent pass.
    pub fn iter(&self) -> indexmap::map::Values<'_, Timestamp, Period<V>> {
        self.periods.values()
    }

    /// Timestamps in ascending order.
    pub fn timestamps(&self) -> indexmap::map::Keys<'_, Timestamp, Period<V>> {
        self.periods.keys()
    }

    /// Adds `period`, replacing and returning any period already keyed to
    /// its timestamp.
    pub fn insert(&mut self, period: Period<V>) -> Option<Period<V>> {
        self.periods.insert_sorted(period.timestamp, period).1
    }

    /// Replaces the period at a sorted position and returns the old one.
    ///
    /// # Errors
    ///
    /// [`Error::PositionOutOfRange`] for a bad position and
    /// [`Error::TimestampMismatch`] when `period` is keyed to a different
    /// timestamp than the one it replaces.
    pub fn set_at(&mut self, position: isize, period: Period<V>) -> Result<Period<V>> {
        let len = self.len();
        let index = self
            .resolve(position)
            .ok_or(Error::PositionOutOfRange { position, len })?;
        let (timestamp, slot) = self
            .periods
            .get_index_mut(index)
            .ok_or(Error::PositionOutOfRange { position, len })?;

        if *timestamp != period.timestamp {
            return Err(Error::TimestampMismatch {
                position: index,
                expected: *timestamp,
                found: period.timestamp,
            });
        }

        Ok(std::mem::replace(slot, period))
    }

    /// Copies in every period of `other` whose timestamp is not present
    /// yet. Returns the number of periods added.
    pub fn merge(&mut self, other: &Series<V>) -> usize
    where
        V: Clone,
    {
        let mut added = 0;
        for period in other {
            if !self.contains(&period.timestamp) {
                self.insert(period.clone());
                added += 1;
            }
        }
        added
    }

    fn resolve(&self, position: isize) -> Option<usize> {
        let len = self.len();
        let index = match usize::try_from(position) {
            Ok(index) => index,
            Err(_) => len.checked_sub(position.unsigned_abs())?,
        };
        (index < len).then_some(index)
    }
}

impl<'a, V> IntoIterator for &'a Series<V> {
    type Item = &'a Period<V>;
    type IntoIter = indexmap::map::Values<'a, Timestamp, Period<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V> Display for Series<V>
where
    Period<V>: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, period) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{period}")?;
        }
        Ok(())
    }
}
