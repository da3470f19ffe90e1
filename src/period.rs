use crate::{Bar, Price, Timestamp};

use std::fmt::{Display, Formatter};

pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A value anchored to a timestamp.
///
/// The payload `V` distinguishes the kinds of period:
/// [`PricePeriod`] carries a [`Bar`], [`EmaPeriod`] a single average and
/// [`MacdPeriod`](crate::MacdPeriod) a synthesized MACD triple.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Period<V> {
    pub timestamp: Timestamp,
    pub value: V,
}

impl<V> Period<V> {
    #[must_use]
    pub fn new(timestamp: Timestamp, value: V) -> Self {
        Self { timestamp, value }
    }
}

/// One sampled interval of price data.
pub type PricePeriod = Period<Bar>;

/// One value of an exponential moving average.
pub type EmaPeriod = Period<Price>;

impl Display for Period<Bar> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:\nopen:{:.6}\nhigh:{:.6}\nlow:{:.6}\nclose:{:.6}\nvolume:{:.6}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.value.open,
            self.value.high,
            self.value.low,
            self.value.close,
            self.value.volume,
        )
    }
}

impl Display for Period<Price> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:.6}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.value
        )
    }
}
