//! Price value object.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// A non-negative amount of money in cents.
///
/// The gateway speaks decimal strings with at most two fraction digits
/// ("0.1", "0.10", "12"); `Display` always renders two digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Result<Self, ValidationError> {
        if cents < 0 {
            return Err(ValidationError::out_of_range("price", 0, i64::MAX, cents));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Unit price times a count, failing on overflow.
    pub fn times(&self, count: i64) -> Result<Self, ValidationError> {
        let total = self
            .0
            .checked_mul(count)
            .ok_or_else(|| ValidationError::out_of_range("count", 1, i64::MAX / self.0.max(1), count))?;
        Self::from_cents(total)
    }

    /// Parses the gateway's decimal text form.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::empty_field("price"));
        }

        let invalid = || ValidationError::invalid_format("price", format!("not a price: {}", raw));

        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (raw, None),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;

        let fraction_cents = match fraction {
            None => 0,
            Some(f) if (1..=2).contains(&f.len()) && f.chars().all(|c| c.is_ascii_digit()) => {
                let digits: i64 = f.parse().map_err(|_| invalid())?;
                if f.len() == 1 {
                    digits * 10
                } else {
                    digits
                }
            }
            Some(_) => return Err(invalid()),
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or_else(invalid)?;
        Self::from_cents(cents)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(raw: &str) -> i64 {
        Price::parse(raw).unwrap().cents()
    }

    #[test]
    fn parses_gateway_spellings() {
        assert_eq!(cents("0.10"), 10);
        assert_eq!(cents("0.1"), 10);
        assert_eq!(cents("1"), 100);
        assert_eq!(cents("12.05"), 1205);
        assert_eq!(cents(" 3.00 "), 300);
    }

    #[test]
    fn rejects_non_prices() {
        for raw in ["", "abc", "-1", "1.234", "1.", ".5", "1,00", "+1"] {
            assert!(Price::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Price::from_cents(10).unwrap().to_string(), "0.10");
        assert_eq!(Price::from_cents(100).unwrap().to_string(), "1.00");
        assert_eq!(Price::from_cents(1205).unwrap().to_string(), "12.05");
    }

    #[test]
    fn times_multiplies_and_guards_overflow() {
        let unit = Price::from_cents(10).unwrap();
        assert_eq!(unit.times(25).unwrap().cents(), 250);
        assert!(unit.times(i64::MAX).is_err());
        assert!(unit.times(-1).is_err());
    }
}
