//! Signed nanosecond durations with the textual form used by Starlark's
//! `time` module (`1h2m3.5s`, `1.5ms`, `0s`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

const NANOSECOND: u128 = 1;
const MICROSECOND: u128 = 1_000 * NANOSECOND;
const MILLISECOND: u128 = 1_000 * MICROSECOND;
const SECOND: u128 = 1_000 * MILLISECOND;
const MINUTE: u128 = 60 * SECOND;
const HOUR: u128 = 60 * MINUTE;

/// Fraction digits beyond this count cannot affect a nanosecond result.
const MAX_FRACTION_DIGITS: usize = 18;

/// A signed span of time with nanosecond resolution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct ScriptDuration(i64);

impl ScriptDuration {
    /// The empty duration.
    pub const ZERO: ScriptDuration = ScriptDuration(0);

    /// Create a duration from nanoseconds.
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    /// Create a duration from whole seconds, saturating on overflow.
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs.saturating_mul(SECOND as i64))
    }

    /// Create a duration from whole minutes, saturating on overflow.
    pub const fn from_mins(mins: i64) -> Self {
        Self(mins.saturating_mul(MINUTE as i64))
    }

    /// Nanoseconds in this duration.
    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    /// Returns true if the duration is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Convert to a standard duration; negative spans have no equivalent.
    pub fn to_std(&self) -> Option<std::time::Duration> {
        u64::try_from(self.0)
            .ok()
            .map(std::time::Duration::from_nanos)
    }

    /// Parse text such as `300ms`, `-1.5h` or `2h45m`.
    pub fn parse(text: &str) -> Result<Self, ValueError> {
        parse_duration(text).ok_or_else(|| ValueError::InvalidDuration(text.to_string()))
    }
}

impl From<std::time::Duration> for ScriptDuration {
    fn from(value: std::time::Duration) -> Self {
        Self(i64::try_from(value.as_nanos()).unwrap_or(i64::MAX))
    }
}

impl FromStr for ScriptDuration {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ScriptDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            f.write_str("-")?;
        }
        let magnitude = u128::from(self.0.unsigned_abs());

        if magnitude < SECOND {
            if magnitude == 0 {
                return f.write_str("0s");
            }
            if magnitude < MICROSECOND {
                return write!(f, "{}ns", magnitude);
            }
            let (unit, scale, digits) = if magnitude < MILLISECOND {
                ("µs", MICROSECOND, 3)
            } else {
                ("ms", MILLISECOND, 6)
            };
            let (whole, frac) = split_fraction(magnitude, scale, digits);
            return write!(f, "{}{}{}", whole, frac, unit);
        }

        let (secs, frac) = split_fraction(magnitude, SECOND, 9);
        let hours = secs / 3600;
        let mins = (secs / 60) % 60;
        let secs = secs % 60;
        if hours > 0 {
            write!(f, "{}h{}m", hours, mins)?;
        } else if mins > 0 {
            write!(f, "{}m", mins)?;
        }
        write!(f, "{}{}s", secs, frac)
    }
}

fn split_fraction(value: u128, scale: u128, digits: usize) -> (u128, String) {
    let whole = value / scale;
    let frac = value % scale;
    if frac == 0 {
        return (whole, String::new());
    }
    let padded = format!("{:0width$}", frac, width = digits);
    (whole, format!(".{}", padded.trim_end_matches('0')))
}

fn unit_scale(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(NANOSECOND),
        "us" | "\u{00b5}s" | "\u{03bc}s" => Some(MICROSECOND),
        "ms" => Some(MILLISECOND),
        "s" => Some(SECOND),
        "m" => Some(MINUTE),
        "h" => Some(HOUR),
        _ => None,
    }
}

fn parse_duration(text: &str) -> Option<ScriptDuration> {
    let (negative, mut rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if rest == "0" {
        return Some(ScriptDuration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }

    let limit: u128 = if negative {
        1u128 << 63
    } else {
        (1u128 << 63) - 1
    };
    let mut total: u128 = 0;

    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let mut whole: u128 = 0;
        for digit in rest[..int_len].bytes() {
            whole = whole.checked_mul(10)?.checked_add(u128::from(digit - b'0'))?;
            if whole > limit {
                return None;
            }
        }
        rest = &rest[int_len..];

        let mut frac: u128 = 0;
        let mut frac_scale: u128 = 1;
        let mut frac_len = 0;
        if let Some(after_dot) = rest.strip_prefix('.') {
            frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            for digit in after_dot[..frac_len].bytes().take(MAX_FRACTION_DIGITS) {
                frac = frac * 10 + u128::from(digit - b'0');
                frac_scale *= 10;
            }
            rest = &after_dot[frac_len..];
        }
        if int_len == 0 && frac_len == 0 {
            return None;
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(rest.len(), |(idx, _)| idx);
        if unit_len == 0 {
            return None;
        }
        let scale = unit_scale(&rest[..unit_len])?;
        rest = &rest[unit_len..];

        let mut component = whole.checked_mul(scale)?;
        component += frac * scale / frac_scale;
        total = total.checked_add(component)?;
        if total > limit {
            return None;
        }
    }

    let nanos = if negative {
        (total as i128).checked_neg()?
    } else {
        total as i128
    };
    i64::try_from(nanos).ok().map(ScriptDuration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_matches_time_module() {
        assert_eq!(ScriptDuration::ZERO.to_string(), "0s");
        assert_eq!(ScriptDuration::from_nanos(999).to_string(), "999ns");
        assert_eq!(ScriptDuration::from_nanos(1_500).to_string(), "1.5µs");
        assert_eq!(ScriptDuration::from_nanos(1_500_000).to_string(), "1.5ms");
        assert_eq!(ScriptDuration::from_secs(1).to_string(), "1s");
        assert_eq!(ScriptDuration::from_secs(90).to_string(), "1m30s");
        assert_eq!(ScriptDuration::from_secs(5400).to_string(), "1h30m0s");
        assert_eq!(ScriptDuration::from_mins(15).to_string(), "15m0s");
        assert_eq!(ScriptDuration::from_nanos(-2_500_000_000).to_string(), "-2.5s");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(ScriptDuration::parse("0").unwrap(), ScriptDuration::ZERO);
        assert_eq!(ScriptDuration::parse("1s").unwrap(), ScriptDuration::from_secs(1));
        assert_eq!(ScriptDuration::parse("15m").unwrap(), ScriptDuration::from_mins(15));
        assert_eq!(
            ScriptDuration::parse("1h30m").unwrap(),
            ScriptDuration::from_secs(5400)
        );
        assert_eq!(
            ScriptDuration::parse("1.5ms").unwrap(),
            ScriptDuration::from_nanos(1_500_000)
        );
        assert_eq!(
            ScriptDuration::parse("2µs").unwrap(),
            ScriptDuration::from_nanos(2_000)
        );
        assert_eq!(
            ScriptDuration::parse("-.5s").unwrap(),
            ScriptDuration::from_nanos(-500_000_000)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in ["", "5", "1x", "s", "1..5s", "-", "9223372036854775808ns"] {
            assert!(ScriptDuration::parse(text).is_err(), "{text} should not parse");
        }
    }

    #[test]
    fn test_extremes_round_trip() {
        for nanos in [i64::MAX, i64::MIN, 1, -1] {
            let duration = ScriptDuration::from_nanos(nanos);
            assert_eq!(ScriptDuration::parse(&duration.to_string()).unwrap(), duration);
        }
    }

    #[test]
    fn test_to_std() {
        assert_eq!(
            ScriptDuration::from_secs(1).to_std(),
            Some(std::time::Duration::from_secs(1))
        );
        assert_eq!(ScriptDuration::from_secs(-1).to_std(), None);
    }
}
