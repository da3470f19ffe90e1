use crate::{Bar, Ohlcv, Price};

use std::fmt::{Display, Formatter};

/// Key selector applied to each source period before it is averaged.
///
/// An EMA is bound to one `PriceSource` for life. Scalar series (an EMA of
/// another EMA, the MACD line) carry a single value and ignore it.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug)]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    /// Traded volume, for volume averages.
    Volume,
    /// Median price: `(high + low) / 2`.
    HL2,
    /// Typical price: `(high + low + close) / 3`.
    HLC3,
    /// Average price: `(open + high + low + close) / 4`.
    OHLC4,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl PriceSource {
    #[inline]
    pub fn extract(self, ohlcv: &impl Ohlcv) -> Price {
        match self {
            Self::Open => ohlcv.open(),
            Self::High => ohlcv.high(),
            Self::Low => ohlcv.low(),
            Self::Close => ohlcv.close(),
            Self::Volume => ohlcv.volume(),
            Self::HL2 => f64::midpoint(ohlcv.high(), ohlcv.low()),
            Self::HLC3 => (ohlcv.high() + ohlcv.low() + ohlcv.close()) / 3.0,
            Self::OHLC4 => (ohlcv.open() + ohlcv.high() + ohlcv.low() + ohlcv.close()) / 4.0,
        }
    }
}

/// A period payload that reduces to the scalar an EMA averages.
pub trait Sample {
    fn sample(&self, source: PriceSource) -> Price;
}

impl Sample for Bar {
    #[inline]
    fn sample(&self, source: PriceSource) -> Price {
        source.extract(self)
    }
}

impl Sample for Price {
    #[inline]
    fn sample(&self, _source: PriceSource) -> Price {
        *self
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::assert_approx;

    fn bar() -> Bar {
        Bar::new(10.0, 30.0, 5.0, 20.0, 1_500.0)
    }

    mod extract {
        use super::*;

        #[test]
        fn fields() {
            let bar = bar();
            assert_eq!(PriceSource::Open.extract(&bar), 10.0);
            assert_eq!(PriceSource::High.extract(&bar), 30.0);
            assert_eq!(PriceSource::Low.extract(&bar), 5.0);
            assert_eq!(PriceSource::Close.extract(&bar), 20.0);
            assert_eq!(PriceSource::Volume.extract(&bar), 1_500.0);
        }

        #[test]
        fn hl2() {
            // (30 + 5) / 2
            assert_eq!(PriceSource::HL2.extract(&bar()), 17.5);
        }

        #[test]
        fn hlc3() {
            // (30 + 5 + 20) / 3
            assert_approx!(PriceSource::HLC3.extract(&bar()), 55.0 / 3.0);
        }

        #[test]
        fn ohlc4() {
            // (10 + 30 + 5 + 20) / 4
            assert_eq!(PriceSource::OHLC4.extract(&bar()), 16.25);
        }

        #[test]
        fn close_is_default() {
            assert_eq!(PriceSource::default(), PriceSource::Close);
        }
    }

    mod sample {
        use super::*;

        #[test]
        fn bar_uses_source() {
            assert_eq!(bar().sample(PriceSource::High), 30.0);
            assert_eq!(bar().sample(PriceSource::Close), 20.0);
        }

        #[test]
        fn scalar_ignores_source() {
            let value: Price = 3.5;
            assert_eq!(value.sample(PriceSource::High), 3.5);
            assert_eq!(value.sample(PriceSource::Volume), 3.5);
        }
    }

    #[test]
    fn display() {
        assert_eq!(PriceSource::HL2.to_string(), "HL2");
        assert_eq!(PriceSource::Close.to_string(), "Close");
    }
}
