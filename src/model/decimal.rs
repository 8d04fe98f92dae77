//! Arbitrary-precision decimal numbers
//!
//! Results coming from document parsing or from the server may carry more
//! digits than an `f64` can hold, and the number of fractional digits is
//! significant: `5.0` and `5` are different measurements. `Decimal` keeps the
//! unscaled integer and the scale separately so both are preserved.

use crate::error::{Error, Result};
use num_bigint::{BigInt, Sign};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Largest exponent accepted when parsing scientific notation
const MAX_EXPONENT: i64 = 4096;

/// A decimal number `unscaled × 10^-scale`
///
/// The derived equality is *structural*: `5.0` (50, scale 1) and `5`
/// (5, scale 0) are not equal. Use [`Decimal::numeric_eq`] to compare by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: BigInt,
    scale: u32,
}

impl Decimal {
    /// Create a decimal from its unscaled value and scale
    pub fn new(unscaled: impl Into<BigInt>, scale: u32) -> Self {
        Self {
            unscaled: unscaled.into(),
            scale,
        }
    }

    /// The unscaled integer value
    pub fn unscaled(&self) -> &BigInt {
        &self.unscaled
    }

    /// Number of digits after the decimal point
    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Compare by mathematical value, ignoring scale
    pub fn numeric_eq(&self, other: &Decimal) -> bool {
        match self.scale.cmp(&other.scale) {
            Ordering::Equal => self.unscaled == other.unscaled,
            Ordering::Less => {
                rescale(&self.unscaled, other.scale - self.scale) == other.unscaled
            }
            Ordering::Greater => {
                self.unscaled == rescale(&other.unscaled, self.scale - other.scale)
            }
        }
    }
}

fn rescale(value: &BigInt, digits: u32) -> BigInt {
    value * BigInt::from(10u32).pow(digits)
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self::new(value, 0)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Self::new(value, 0)
    }
}

impl FromStr for Decimal {
    type Err = Error;

    /// Parse `-12.340`, `.5`, `1e3` or `1.5E-2`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Other(format!("Invalid decimal '{s}'"));
        let text = s.trim();

        let (mantissa, exponent) = match text.find(['e', 'E']) {
            Some(pos) => {
                let exp: i64 = text[pos + 1..].parse().map_err(|_| invalid())?;
                if exp.abs() > MAX_EXPONENT {
                    return Err(invalid());
                }
                (&text[..pos], exp)
            }
            None => (text, 0),
        };

        let (negative, digits) = match mantissa.as_bytes().first() {
            Some(b'-') => (true, &mantissa[1..]),
            Some(b'+') => (false, &mantissa[1..]),
            _ => (false, mantissa),
        };

        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let all_digits = format!("{int_part}{frac_part}");
        let mut unscaled = BigInt::parse_bytes(all_digits.as_bytes(), 10).ok_or_else(invalid)?;
        if negative {
            unscaled = -unscaled;
        }

        let scale = frac_part.len() as i64 - exponent;
        if scale < 0 {
            Ok(Self::new(rescale(&unscaled, (-scale) as u32), 0))
        } else {
            Ok(Self::new(unscaled, scale as u32))
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.unscaled.magnitude().to_string();
        let sign = if self.unscaled.sign() == Sign::Minus {
            "-"
        } else {
            ""
        };

        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }

        let padded = if digits.len() <= scale {
            format!("{}{digits}", "0".repeat(scale - digits.len() + 1))
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("5", 5, 0 ; "integer")]
    #[test_case("5.0", 50, 1 ; "trailing zero keeps scale")]
    #[test_case("-12.340", -12340, 3 ; "negative")]
    #[test_case(".5", 5, 1 ; "no integer part")]
    #[test_case("+7.", 7, 0 ; "explicit plus and trailing dot")]
    #[test_case("1e3", 1000, 0 ; "positive exponent")]
    #[test_case("1.5E-2", 15, 3 ; "negative exponent")]
    fn test_parse(input: &str, unscaled: i64, scale: u32) {
        let decimal: Decimal = input.parse().unwrap();
        assert_eq!(decimal, Decimal::new(unscaled, scale));
    }

    #[test_case("" ; "empty")]
    #[test_case("." ; "dot only")]
    #[test_case("1.2.3" ; "two dots")]
    #[test_case("abc" ; "letters")]
    #[test_case("1e" ; "missing exponent")]
    #[test_case("1e99999" ; "huge exponent")]
    fn test_parse_invalid(input: &str) {
        assert!(input.parse::<Decimal>().is_err());
    }

    #[test]
    fn test_parse_beyond_i64() {
        let decimal: Decimal = "123456789012345678901234567890.5".parse().unwrap();
        assert_eq!(decimal.scale(), 1);
        assert_eq!(decimal.to_string(), "123456789012345678901234567890.5");
    }

    #[test]
    fn test_structural_vs_numeric_equality() {
        let a: Decimal = "5.0".parse().unwrap();
        let b: Decimal = "5".parse().unwrap();
        assert_ne!(a, b);
        assert!(a.numeric_eq(&b));
        assert!(b.numeric_eq(&a));

        let c: Decimal = "5.01".parse().unwrap();
        assert!(!a.numeric_eq(&c));
    }

    #[test_case(Decimal::new(5, 0), "5")]
    #[test_case(Decimal::new(50, 1), "5.0")]
    #[test_case(Decimal::new(-5, 3), "-0.005")]
    #[test_case(Decimal::new(123, 2), "1.23")]
    fn test_display(decimal: Decimal, expected: &str) {
        assert_eq!(decimal.to_string(), expected);
    }
}
