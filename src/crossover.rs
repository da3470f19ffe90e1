use crate::{Error, Price, Result, Series, Timestamp, period::TIMESTAMP_FORMAT};

use std::fmt::{Debug, Display, Formatter};
use tracing::trace;

/// Side of the threshold a monitored value is on.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Sign of `value - threshold`.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateSign`] when the value sits exactly on the
    /// threshold (or either is NaN).
    pub fn of(timestamp: Timestamp, value: Price, threshold: Price) -> Result<Self> {
        let distance = value - threshold;
        if distance > 0.0 {
            Ok(Self::Positive)
        } else if distance < 0.0 {
            Ok(Self::Negative)
        } else {
            Err(Error::DegenerateSign {
                timestamp,
                threshold,
            })
        }
    }

    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Positive => Self::Negative,
            Self::Negative => Self::Positive,
        }
    }

    /// `+1` or `-1`.
    #[must_use]
    pub fn signum(self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Negative => -1,
        }
    }
}

impl Display for Sign {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Indicator a [`Notification`] originates from.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub enum IndicatorKind {
    Ema,
    Macd,
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ema => f.write_str("EMA"),
            Self::Macd => f.write_str("MACD"),
        }
    }
}

/// A detected crossing, handed once to the subscriber callback.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Notification {
    pub timestamp: Timestamp,
    pub indicator: IndicatorKind,
    /// Side of the threshold the value moved to.
    pub sign: Sign,
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} crossover at {}",
            self.indicator,
            self.sign,
            self.timestamp.format(TIMESTAMP_FORMAT)
        )
    }
}

/// Subscriber callback, invoked synchronously from within `extend`.
pub type Callback = Box<dyn FnMut(Notification)>;

/// Threshold crossing detector for a scalar series.
///
/// The first period seeds the sign of `value - threshold`. Each call to
/// [`scan`](Self::scan) examines only periods it has not seen yet and
/// fires the callback whenever the sign changes, so the total cost over
/// the life of a series is linear in its length.
///
/// The scanned series must only grow at its end; positions already
/// scanned are never revisited.
pub struct Crossover {
    indicator: IndicatorKind,
    threshold: Price,
    callback: Callback,
    next: usize,
    last_sign: Option<Sign>,
}

impl Crossover {
    pub fn new(
        indicator: IndicatorKind,
        threshold: Price,
        callback: impl FnMut(Notification) + 'static,
    ) -> Self {
        Self {
            indicator,
            threshold,
            callback: Box::new(callback),
            next: 1,
            last_sign: None,
        }
    }

    #[must_use]
    pub fn threshold(&self) -> Price {
        self.threshold
    }

    /// Sign after the last scanned period, `None` before seeding.
    #[must_use]
    pub fn last_sign(&self) -> Option<Sign> {
        self.last_sign
    }

    /// Number of leading periods already examined.
    #[must_use]
    pub fn scanned(&self) -> usize {
        if self.last_sign.is_some() { self.next } else { 0 }
    }

    /// Examines the periods of `series` past the last scanned position and
    /// returns the number of notifications fired.
    ///
    /// # Errors
    ///
    /// [`Error::DegenerateSign`] for a value equal to the threshold. The
    /// scan position stays on that period; notifications fired before it
    /// are not rolled back.
    pub fn scan(&mut self, series: &Series<Price>) -> Result<usize> {
        let mut sign = match self.last_sign {
            Some(sign) => sign,
            None => {
                let Some(first) = series.earliest() else {
                    return Ok(0);
                };
                let sign = Sign::of(first.timestamp, first.value, self.threshold)?;
                self.last_sign = Some(sign);
                sign
            }
        };

        let mut fired = 0;
        for period in series.slice(self.next..) {
            if Sign::of(period.timestamp, period.value, self.threshold)? != sign {
                sign = sign.flip();
                self.last_sign = Some(sign);

                let notification = Notification {
                    timestamp: period.timestamp,
                    indicator: self.indicator,
                    sign,
                };
                trace!(%notification, "crossover");
                (self.callback)(notification);
                fired += 1;
            }
            self.next += 1;
        }

        Ok(fired)
    }
}

impl Debug for Crossover {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crossover")
            .field("indicator", &self.indicator)
            .field("threshold", &self.threshold)
            .field("next", &self.next)
            .field("last_sign", &self.last_sign)
            .finish_non_exhaustive()
    }
}
