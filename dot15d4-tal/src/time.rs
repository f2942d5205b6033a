//! Time structures.
//!
//! - [`Instant`] is a point on the 32-bit microsecond clock of the timer
//!   service. The clock wraps at 2^32 µs (about 71 minutes); comparisons are
//!   only meaningful between instants less than 2^31 µs apart.
//! - [`Duration`] is a span of microseconds.
//! - [`SymbolTime`] is a point in time counted in symbols, kept within 28 bits
//!   as the beacon timestamps of the PIB are.

use dot15d4_tal_frame::PHR_LEN;

use crate::constants::{PHY_OVERHEAD, SYMBOLS_PER_OCTET, SYMBOL_DURATION_US, SYMBOL_MASK};

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Instant {
    us: u32,
}

impl Instant {
    /// Create a new `Instant` from a raw clock value in microseconds.
    pub const fn from_us(us: u32) -> Self {
        Self { us }
    }

    /// Returns the raw clock value in microseconds.
    pub const fn as_us(&self) -> u32 {
        self.us
    }

    /// Returns `true` when `self` lies strictly after `other`, accounting for
    /// clock wrap.
    pub const fn is_after(&self, other: Instant) -> bool {
        (self.us.wrapping_sub(other.us) as i32) > 0
    }

    /// Returns `true` once `self` has reached `deadline`.
    pub const fn has_reached(&self, deadline: Instant) -> bool {
        (self.us.wrapping_sub(deadline.us) as i32) >= 0
    }

    /// Convert to symbol time.
    pub const fn to_symbols(&self) -> SymbolTime {
        SymbolTime::from_symbols(self.us / SYMBOL_DURATION_US)
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Default)]
pub struct Duration(u32);

impl Duration {
    pub const ZERO: Self = Self(0);

    /// Create a new `Duration` from microseconds.
    pub const fn from_us(us: u32) -> Self {
        Self(us)
    }

    /// Create a new `Duration` from a number of symbols.
    pub const fn from_symbols(symbols: u32) -> Self {
        Self(symbols_to_us(symbols))
    }

    /// Returns the duration as microseconds.
    pub const fn as_us(&self) -> u32 {
        self.0
    }

    /// Returns the duration as whole symbols.
    pub const fn as_symbols(&self) -> u32 {
        us_to_symbols(self.0)
    }
}

impl core::ops::Add<Duration> for Instant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::from_us(self.us.wrapping_add(rhs.as_us()))
    }
}

impl core::ops::Sub<Duration> for Instant {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self::from_us(self.us.wrapping_sub(rhs.as_us()))
    }
}

impl core::ops::Sub for Instant {
    type Output = Duration;

    /// Elapsed time from `rhs` to `self`, modulo the clock wrap.
    fn sub(self, rhs: Instant) -> Self::Output {
        Duration::from_us(self.us.wrapping_sub(rhs.us))
    }
}

impl core::ops::Add<Duration> for Duration {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self::from_us(self.0.saturating_add(rhs.0))
    }
}

impl core::ops::Mul<u32> for Duration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self::from_us(self.0.saturating_mul(rhs))
    }
}

impl core::fmt::Display for Instant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}ms", self.as_us() as f32 / 1000.0)
    }
}

impl core::fmt::Display for Duration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}ms", self.as_us() as f32 / 1000.0)
    }
}

/// A point in time in symbols, modulo 2^28.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SymbolTime(u32);

impl SymbolTime {
    pub const fn from_symbols(symbols: u32) -> Self {
        Self(symbols & SYMBOL_MASK)
    }

    pub const fn as_symbols(&self) -> u32 {
        self.0
    }

    /// Add a number of symbols, wrapping within 28 bits.
    pub const fn add_symbols(self, symbols: u32) -> Self {
        Self::from_symbols(self.0.wrapping_add(symbols))
    }

    /// Subtract a number of symbols, wrapping within 28 bits.
    pub const fn sub_symbols(self, symbols: u32) -> Self {
        Self::from_symbols(self.0.wrapping_sub(symbols))
    }

    /// Symbols elapsed from `earlier` to `self`, wrapping within 28 bits.
    pub const fn since(self, earlier: SymbolTime) -> u32 {
        self.0.wrapping_sub(earlier.0) & SYMBOL_MASK
    }

    /// Returns `true` when `self` lies strictly after `other` on the 28-bit
    /// circle.
    pub const fn is_after(self, other: SymbolTime) -> bool {
        let diff = self.since(other);
        diff != 0 && diff < (SYMBOL_MASK >> 1)
    }

    /// Convert to the µs clock, matching the low 32 bits of `Instant`.
    pub const fn to_instant(self) -> Instant {
        Instant::from_us(symbols_to_us(self.0))
    }
}

/// Conversion of symbols to microseconds (2.4 GHz O-QPSK).
pub const fn symbols_to_us(symbols: u32) -> u32 {
    symbols.wrapping_mul(SYMBOL_DURATION_US)
}

/// Conversion of microseconds to symbols (2.4 GHz O-QPSK).
pub const fn us_to_symbols(us: u32) -> u32 {
    us / SYMBOL_DURATION_US
}

/// Time on air of a frame with a PSDU of `psdu_len` octets, preamble, SFD
/// and PHR included.
pub const fn frame_duration(psdu_len: u32) -> Duration {
    Duration::from_symbols((PHY_OVERHEAD + PHR_LEN as u32 + psdu_len) * SYMBOLS_PER_OCTET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_FRAME_DURATION_US;

    #[test]
    fn instant() {
        let a = Instant::from_us(100);
        assert_eq!(a.us, 100);
        assert_eq!(a.as_us(), 100);
        assert_eq!((a + Duration::from_us(50)).as_us(), 150);
        assert_eq!((a - Duration::from_us(50)).as_us(), 50);
    }

    #[test]
    fn deadline_across_wrap() {
        let delta = Duration::from_us(1_000);
        for offset in [0u32, 1, 500, 999] {
            let now = Instant::from_us(u32::MAX - offset);
            let deadline = now + delta;

            // The deadline numerically wrapped below `now`.
            assert!(deadline.as_us() < now.as_us());
            assert!(deadline.is_after(now));
            assert!(!now.has_reached(deadline));

            let later = now + Duration::from_us(999);
            assert!(!later.has_reached(deadline));
            assert!((now + delta).has_reached(deadline));
            assert!((now + delta + Duration::from_us(1)).has_reached(deadline));
        }
    }

    #[test]
    fn elapsed_across_wrap() {
        let start = Instant::from_us(u32::MAX - 9);
        let end = Instant::from_us(10);
        assert_eq!((end - start).as_us(), 20);
    }

    #[test]
    fn symbol_time_wraps_at_28_bits() {
        let t = SymbolTime::from_symbols(SYMBOL_MASK - 4);
        let u = t.add_symbols(10);
        assert_eq!(u.as_symbols(), 5);
        assert_eq!(u.since(t), 10);
        assert_eq!(u.sub_symbols(10), t);
        assert!(u.is_after(t));
        assert!(!t.is_after(u));
        assert!(!t.is_after(t));
    }

    #[test]
    fn conversions() {
        assert_eq!(symbols_to_us(20), 320);
        assert_eq!(us_to_symbols(320), 20);
        assert_eq!(Duration::from_symbols(960).as_us(), 15_360);
        assert_eq!(Instant::from_us(3200).to_symbols().as_symbols(), 200);
        assert_eq!(SymbolTime::from_symbols(200).to_instant().as_us(), 3200);
        // 6 octets of synchronization header and PHR, 5 octets of ACK.
        assert_eq!(frame_duration(5).as_us(), 352);
        assert_eq!(frame_duration(127).as_us(), MAX_FRAME_DURATION_US);
    }
}
