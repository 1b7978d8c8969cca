//! Signed seconds/nanoseconds time value.

use core::fmt;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};
use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// A point or span on the real-time axis.
///
/// Stored as whole seconds plus a nanosecond remainder normalised into
/// `0..1_000_000_000`, so `-0.25s` is `(-1, 750_000_000)`. Field order gives
/// the derived `Ord` the same ordering as the underlying nanosecond count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RealTime {
    pub sec: i32,
    pub nsec: i32,
}

impl RealTime {
    pub const ZERO: RealTime = RealTime { sec: 0, nsec: 0 };

    /// One nanosecond. The smallest representable step.
    pub const TICK: RealTime = RealTime { sec: 0, nsec: 1 };

    /// Build from seconds and nanoseconds; out-of-range nanoseconds carry into seconds.
    pub fn new(sec: i32, nsec: i32) -> Self {
        Self::from_nanos(sec as i64 * NANOS_PER_SEC + nsec as i64)
    }

    pub fn from_nanos(nanos: i64) -> Self {
        let sec = nanos.div_euclid(NANOS_PER_SEC);
        let nsec = nanos.rem_euclid(NANOS_PER_SEC);
        Self {
            sec: sec.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
            nsec: nsec as i32,
        }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self::from_nanos(millis.saturating_mul(1_000_000))
    }

    pub fn from_micros(micros: i64) -> Self {
        Self::from_nanos(micros.saturating_mul(1_000))
    }

    pub fn from_seconds(seconds: f64) -> Self {
        Self::from_nanos((seconds * NANOS_PER_SEC as f64).round() as i64)
    }

    #[inline]
    pub fn as_nanos(&self) -> i64 {
        self.sec as i64 * NANOS_PER_SEC + self.nsec as i64
    }

    pub fn as_millis(&self) -> i64 {
        self.as_nanos().div_euclid(1_000_000)
    }

    pub fn as_seconds(&self) -> f64 {
        self.as_nanos() as f64 / NANOS_PER_SEC as f64
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.sec == 0 && self.nsec == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.sec < 0
    }

    pub fn to_duration(&self) -> Option<std::time::Duration> {
        u64::try_from(self.as_nanos())
            .ok()
            .map(std::time::Duration::from_nanos)
    }

    pub fn from_duration(duration: std::time::Duration) -> Self {
        Self::from_nanos(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl Add for RealTime {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::from_nanos(self.as_nanos().saturating_add(other.as_nanos()))
    }
}

impl AddAssign for RealTime {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RealTime {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::from_nanos(self.as_nanos().saturating_sub(other.as_nanos()))
    }
}

impl SubAssign for RealTime {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for RealTime {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_nanos(-self.as_nanos())
    }
}

impl Mul<i32> for RealTime {
    type Output = Self;

    fn mul(self, factor: i32) -> Self {
        Self::from_nanos(self.as_nanos().saturating_mul(factor as i64))
    }
}

impl Div<i32> for RealTime {
    type Output = Self;

    /// Integer division truncating toward zero. Dividing by zero yields zero.
    fn div(self, divisor: i32) -> Self {
        if divisor == 0 {
            return Self::ZERO;
        }
        Self::from_nanos(self.as_nanos() / divisor as i64)
    }
}

impl fmt::Display for RealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = self.as_nanos();
        let sign = if nanos < 0 { "-" } else { "" };
        let abs = nanos.unsigned_abs();
        write!(
            f,
            "{}{}.{:09}s",
            sign,
            abs / NANOS_PER_SEC as u64,
            abs % NANOS_PER_SEC as u64
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalisation() {
        assert_eq!(RealTime::new(1, 1_500_000_000), RealTime::new(2, 500_000_000));
        assert_eq!(RealTime::new(0, -250_000_000), RealTime { sec: -1, nsec: 750_000_000 });
        assert!(RealTime::new(0, -1).is_negative());
        assert!(!RealTime::ZERO.is_negative());
    }

    #[test]
    fn test_ordering() {
        let a = RealTime::from_millis(-500);
        let b = RealTime::ZERO;
        let c = RealTime::new(0, 1);
        let d = RealTime::new(1, 0);
        assert!(a < b && b < c && c < d);
        assert_eq!(d - RealTime::TICK, RealTime::new(0, 999_999_999));
    }

    #[test]
    fn test_display() {
        assert_eq!(RealTime::from_millis(1500).to_string(), "1.500000000s");
        assert_eq!(RealTime::from_millis(-250).to_string(), "-0.250000000s");
        assert_eq!(RealTime::ZERO.to_string(), "0.000000000s");
    }

    #[test]
    fn test_division_for_midi_clock() {
        // Quarter note at 120 BPM -> 24 clocks per quarter
        let quarter = RealTime::from_millis(500);
        assert_eq!((quarter / 24).as_nanos(), 20_833_333);
        assert_eq!(quarter / 0, RealTime::ZERO);
    }

    #[test]
    fn test_seconds_conversion() {
        let t = RealTime::from_seconds(2.25);
        assert_eq!(t, RealTime::new(2, 250_000_000));
        assert!((t.as_seconds() - 2.25).abs() < 1e-9);
        assert_eq!(t.to_duration(), Some(std::time::Duration::from_millis(2250)));
        assert_eq!(RealTime::from_millis(-1).to_duration(), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let t = RealTime::new(3, 14);
        let json = serde_json::to_string(&t).unwrap();
        let back: RealTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    proptest! {
        #[test]
        fn prop_add_sub_inverse(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
            let x = RealTime::from_nanos(a);
            let y = RealTime::from_nanos(b);
            prop_assert_eq!((x + y) - y, x);
        }

        #[test]
        fn prop_order_matches_nanos(a in -1_000_000_000_000i64..1_000_000_000_000, b in -1_000_000_000_000i64..1_000_000_000_000) {
            let x = RealTime::from_nanos(a);
            let y = RealTime::from_nanos(b);
            prop_assert_eq!(x.cmp(&y), a.cmp(&b));
            prop_assert!((0..1_000_000_000).contains(&x.nsec));
        }
    }
}
