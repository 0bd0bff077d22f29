//! Duration expressions
//!
//! Parses signed duration strings such as `30s`, `1m`, `1h30m`, `1.5h` or `-250ms`.
//! The grammar is shared by the `--interval` setting and `Retry-After` hints:
//! an optional sign followed by one or more `<decimal><unit>` segments, where unit is
//! one of `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m`, `h`. A bare `0` is accepted.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A duration that may be negative
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedDuration {
    /// Whether the expression carried a leading `-`
    pub negative: bool,
    /// Absolute value
    pub magnitude: Duration,
}

impl SignedDuration {
    /// Negative durations collapse to zero
    pub fn non_negative(self) -> Duration {
        if self.negative {
            Duration::ZERO
        } else {
            self.magnitude
        }
    }
}

/// Error returned for strings outside the duration grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDurationError(String);

impl fmt::Display for ParseDurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid duration {:?}", self.0)
    }
}

impl std::error::Error for ParseDurationError {}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3_600 * 1_000_000_000),
        _ => None,
    }
}

impl FromStr for SignedDuration {
    type Err = ParseDurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || ParseDurationError(input.to_string());

        let (negative, mut rest) = match input.as_bytes().first() {
            Some(b'-') => (true, &input[1..]),
            Some(b'+') => (false, &input[1..]),
            _ => (false, input),
        };

        if rest == "0" {
            return Ok(SignedDuration {
                negative,
                magnitude: Duration::ZERO,
            });
        }
        if rest.is_empty() {
            return Err(err());
        }

        let mut total: u128 = 0;
        while !rest.is_empty() {
            let number_len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            let number = &rest[..number_len];
            rest = &rest[number_len..];

            let (whole, frac) = match number.split_once('.') {
                Some((w, f)) => (w, f),
                None => (number, ""),
            };
            if whole.is_empty() && frac.is_empty() {
                return Err(err());
            }

            let unit_len = rest
                .find(|c: char| c.is_ascii_digit() || c == '.')
                .unwrap_or(rest.len());
            let unit = unit_nanos(&rest[..unit_len]).ok_or_else(err)?;
            rest = &rest[unit_len..];

            let whole: u128 = if whole.is_empty() {
                0
            } else {
                whole.parse().map_err(|_| err())?
            };
            let mut segment = whole.checked_mul(unit).ok_or_else(err)?;

            let mut scale = unit;
            for digit in frac.chars() {
                let d = digit.to_digit(10).ok_or_else(err)? as u128;
                scale /= 10;
                if scale == 0 {
                    break;
                }
                segment += d * scale;
            }

            total = total.checked_add(segment).ok_or_else(err)?;
        }

        let secs = u64::try_from(total / 1_000_000_000).map_err(|_| err())?;
        let nanos = (total % 1_000_000_000) as u32;
        Ok(SignedDuration {
            negative,
            magnitude: Duration::new(secs, nanos),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("30s", Duration::from_secs(30) ; "seconds")]
    #[test_case("1m", Duration::from_secs(60) ; "minutes")]
    #[test_case("1h30m", Duration::from_secs(5_400) ; "compound")]
    #[test_case("1.5h", Duration::from_secs(5_400) ; "fractional hours")]
    #[test_case("250ms", Duration::from_millis(250) ; "milliseconds")]
    #[test_case("10us", Duration::from_micros(10) ; "microseconds")]
    #[test_case("0", Duration::ZERO ; "bare zero")]
    #[test_case("+2s", Duration::from_secs(2) ; "explicit plus")]
    fn test_parse_positive(input: &str, expected: Duration) {
        let parsed: SignedDuration = input.parse().unwrap();
        assert!(!parsed.negative);
        assert_eq!(parsed.magnitude, expected);
    }

    #[test]
    fn test_parse_negative_collapses_to_zero() {
        let parsed: SignedDuration = "-5s".parse().unwrap();
        assert!(parsed.negative);
        assert_eq!(parsed.magnitude, Duration::from_secs(5));
        assert_eq!(parsed.non_negative(), Duration::ZERO);
    }

    #[test_case("" ; "empty")]
    #[test_case("30" ; "missing unit")]
    #[test_case("s" ; "missing number")]
    #[test_case("5x" ; "unknown unit")]
    #[test_case("1d" ; "days unsupported")]
    #[test_case("-" ; "sign only")]
    #[test_case("Wed, 21 Oct 2015 07:28:00 GMT" ; "http date")]
    fn test_parse_invalid(input: &str) {
        assert!(input.parse::<SignedDuration>().is_err());
    }
}
