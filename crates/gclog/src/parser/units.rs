//! Units — exact decimal parsing for durations.
//!
//! JVMs print decimals with `.` or `,` depending on locale. Values are parsed
//! digit by digit into integers, so no float rounding leaks into arithmetic.

use std::time::Duration;

/// Fraction digits beyond this are rejected rather than silently truncated.
const MAX_SCALE: u32 = 18;

/// A non-negative decimal number split into whole and fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    pub whole: u64,
    pub fraction: u64,
    /// Number of fraction digits
    pub scale: u32,
}

impl Decimal {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (whole, fraction) = match text.find(|c| c == '.' || c == ',') {
            Some(idx) => (&text[..idx], &text[idx + 1..]),
            None => (text, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let scale = u32::try_from(fraction.len()).ok()?;
        if scale > MAX_SCALE {
            return None;
        }

        Some(Self {
            whole: whole.parse().ok()?,
            fraction: if fraction.is_empty() { 0 } else { fraction.parse().ok()? },
            scale,
        })
    }

    /// Multiply by an integer factor, rounding half up to a whole number.
    pub fn scaled(&self, factor: u64) -> Option<u64> {
        let whole = self.whole.checked_mul(factor)?;
        if self.scale == 0 {
            return Some(whole);
        }
        let divisor = 10u128.pow(self.scale);
        let fraction = (u128::from(self.fraction) * u128::from(factor) + divisor / 2) / divisor;
        whole.checked_add(u64::try_from(fraction).ok()?)
    }
}

/// `"0.0123456"` seconds.
pub fn seconds(text: &str) -> Option<Duration> {
    Decimal::parse(text)?.scaled(1_000_000_000).map(Duration::from_nanos)
}

/// `"3.523"` milliseconds.
pub fn millis(text: &str) -> Option<Duration> {
    Decimal::parse(text)?.scaled(1_000_000).map(Duration::from_nanos)
}

/// `"123456"` nanoseconds.
pub fn nanos(text: &str) -> Option<Duration> {
    text.trim().parse::<u64>().ok().map(Duration::from_nanos)
}

/// Unit a grammar's duration capture is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Millis,
    Nanos,
}

impl TimeUnit {
    pub fn parse(&self, text: &str) -> Option<Duration> {
        match self {
            TimeUnit::Seconds => seconds(text),
            TimeUnit::Millis => millis(text),
            TimeUnit::Nanos => nanos(text),
        }
    }
}
