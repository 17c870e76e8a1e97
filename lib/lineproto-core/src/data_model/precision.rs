use std::fmt;

/// Unit of a point timestamp.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Precision {
    /// Nanoseconds.
    Nanoseconds,

    /// Microseconds.
    Microseconds,

    /// Milliseconds.
    Milliseconds,

    /// Seconds.
    Seconds,

    /// Minutes.
    Minutes,

    /// Hours.
    Hours,

    /// Days.
    Days,
}

impl Precision {
    /// Returns the number of nanoseconds in one unit.
    pub const fn nanos_per_unit(self) -> i64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
            Self::Minutes => 60 * 1_000_000_000,
            Self::Hours => 60 * 60 * 1_000_000_000,
            Self::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    /// Converts `value`, expressed in this unit, to nanoseconds.
    ///
    /// Results that don't fit in an `i64` saturate at `i64::MIN` or `i64::MAX`.
    pub const fn to_nanos(self, value: i64) -> i64 {
        value.saturating_mul(self.nanos_per_unit())
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A timestamp paired with its unit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Timestamp {
    value: i64,
    precision: Precision,
}

impl Timestamp {
    /// Creates a new `Timestamp`.
    pub const fn new(value: i64, precision: Precision) -> Self {
        Self { value, precision }
    }

    /// Returns the raw value, in units of [`precision`][Self::precision].
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// Returns the unit of the raw value.
    pub const fn precision(&self) -> Precision {
        self.precision
    }

    /// Returns the timestamp in nanoseconds, saturating on overflow.
    pub const fn as_nanos(&self) -> i64 {
        self.precision.to_nanos(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_nanos() {
        assert_eq!(Precision::Nanoseconds.to_nanos(1000), 1000);
        assert_eq!(Precision::Microseconds.to_nanos(3), 3_000);
        assert_eq!(Precision::Milliseconds.to_nanos(-2), -2_000_000);
        assert_eq!(Precision::Seconds.to_nanos(1_600_000_000), 1_600_000_000_000_000_000);
        assert_eq!(Precision::Minutes.to_nanos(1), 60_000_000_000);
        assert_eq!(Precision::Hours.to_nanos(1), 3_600_000_000_000);
        assert_eq!(Precision::Days.to_nanos(1), 86_400_000_000_000);
    }

    #[test]
    fn saturates_on_overflow() {
        assert_eq!(Precision::Seconds.to_nanos(i64::MAX / 10), i64::MAX);
        assert_eq!(Precision::Days.to_nanos(i64::MIN / 2), i64::MIN);
    }

    #[test]
    fn timestamp_accessors() {
        let ts = Timestamp::new(5, Precision::Milliseconds);
        assert_eq!(ts.value(), 5);
        assert_eq!(ts.precision(), Precision::Milliseconds);
        assert_eq!(ts.as_nanos(), 5_000_000);
        assert_eq!(ts.precision().to_string(), "ms");
    }
}
