//! Payment card value types.
//!
//! These only check shape (digit counts, month range, expiry against a given
//! date). No Luhn check is performed; the order API is the authority on
//! whether a card is actually chargeable.

use core::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CardNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CardNumberError {
    /// A character other than a digit, space or hyphen was found.
    #[error("card number may only contain digits, spaces and hyphens")]
    InvalidCharacter,
    /// The number does not have exactly 16 digits.
    #[error("card number must have {expected} digits (got {actual})")]
    WrongLength {
        /// Required digit count.
        expected: usize,
        /// Digits found after stripping separators.
        actual: usize,
    },
}

/// A 16-digit card number with separators removed.
///
/// `Display` and `Debug` mask all but the last four digits. Use
/// [`CardNumber::digits`] when the full number must leave the process (order
/// submission only).
///
/// ```
/// use storekeep_core::CardNumber;
///
/// let card = CardNumber::parse("4111 1111-1111 1111").unwrap();
/// assert_eq!(card.digits(), "4111111111111111");
/// assert_eq!(card.to_string(), "**** **** **** 1111");
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardNumber(String);

impl CardNumber {
    /// Number of digits required.
    pub const LENGTH: usize = 16;

    /// Parse a card number, stripping whitespace and hyphens.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-separator, non-digit character is present or
    /// the digit count is not exactly 16.
    pub fn parse(s: &str) -> Result<Self, CardNumberError> {
        let mut digits = String::with_capacity(Self::LENGTH);
        for c in s.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '-' => {}
                c if c.is_whitespace() => {}
                _ => return Err(CardNumberError::InvalidCharacter),
            }
        }

        if digits.len() != Self::LENGTH {
            return Err(CardNumberError::WrongLength {
                expected: Self::LENGTH,
                actual: digits.len(),
            });
        }

        Ok(Self(digits))
    }

    /// The bare 16 digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// The last four digits.
    #[must_use]
    pub fn last_four(&self) -> &str {
        self.0.get(Self::LENGTH - 4..).unwrap_or_default()
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**** **** **** {}", self.last_four())
    }
}

impl fmt::Debug for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CardNumber").field(&self.to_string()).finish()
    }
}

impl TryFrom<String> for CardNumber {
    type Error = CardNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CardNumber> for String {
    fn from(card: CardNumber) -> Self {
        card.0
    }
}

/// Errors that can occur when parsing a [`Cvv`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CvvError {
    /// The input is not 3 or 4 ASCII digits.
    #[error("CVV must be 3 or 4 digits")]
    Invalid,
}

/// A card verification value (3 or 4 digits). Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Cvv(String);

impl Cvv {
    /// Parse a CVV after trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`CvvError::Invalid`] unless the input is 3 or 4 digits.
    pub fn parse(s: &str) -> Result<Self, CvvError> {
        let s = s.trim();
        if matches!(s.len(), 3 | 4) && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_owned()))
        } else {
            Err(CvvError::Invalid)
        }
    }

    /// The CVV digits.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Cvv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cvv([REDACTED])")
    }
}

/// Errors that can occur when validating a [`CardExpiry`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CardExpiryError {
    /// Month outside 1..=12.
    #[error("expiry month must be between 1 and 12 (got {0})")]
    InvalidMonth(u32),
    /// The expiry month lies before the current month.
    #[error("card expired {month:02}/{year}")]
    Expired {
        /// Expiry month.
        month: u32,
        /// Expiry year.
        year: i32,
    },
}

/// Card expiry month and year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardExpiry {
    month: u32,
    year: i32,
}

impl CardExpiry {
    /// Create an expiry, checking the month range.
    ///
    /// # Errors
    ///
    /// Returns [`CardExpiryError::InvalidMonth`] if `month` is not in 1..=12.
    pub const fn new(month: u32, year: i32) -> Result<Self, CardExpiryError> {
        if month < 1 || month > 12 {
            return Err(CardExpiryError::InvalidMonth(month));
        }
        Ok(Self { month, year })
    }

    /// Expiry month (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Expiry year.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// A card is usable through the last day of its expiry month.
    #[must_use]
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        (self.year, self.month) < (today.year(), today.month())
    }

    /// Fails if the card is expired on `today`.
    ///
    /// # Errors
    ///
    /// Returns [`CardExpiryError::Expired`] when `(year, month)` is strictly
    /// before the month containing `today`.
    pub fn check_on(&self, today: NaiveDate) -> Result<(), CardExpiryError> {
        if self.is_expired_on(today) {
            return Err(CardExpiryError::Expired {
                month: self.month,
                year: self.year,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_card_number_strips_separators() {
        let card = CardNumber::parse(" 4111-1111 1111\t1111 ").unwrap();
        assert_eq!(card.digits(), "4111111111111111");
        assert_eq!(card.last_four(), "1111");
    }

    #[test]
    fn test_card_number_wrong_length() {
        assert_eq!(
            CardNumber::parse("4111 1111 1111 111"),
            Err(CardNumberError::WrongLength {
                expected: 16,
                actual: 15
            })
        );
        assert!(CardNumber::parse("4111 1111 1111 1111 1").is_err());
    }

    #[test]
    fn test_card_number_rejects_letters() {
        assert_eq!(
            CardNumber::parse("4111 1111 1111 111a"),
            Err(CardNumberError::InvalidCharacter)
        );
    }

    #[test]
    fn test_card_number_debug_is_masked() {
        let card = CardNumber::parse("4111111111114242").unwrap();
        let debug = format!("{card:?}");
        assert!(debug.contains("4242"));
        assert!(!debug.contains("411111111111"));
    }

    #[test]
    fn test_cvv_lengths() {
        assert!(Cvv::parse("123").is_ok());
        assert!(Cvv::parse("1234").is_ok());
        assert_eq!(Cvv::parse("12"), Err(CvvError::Invalid));
        assert_eq!(Cvv::parse("12345"), Err(CvvError::Invalid));
        assert_eq!(Cvv::parse("12a"), Err(CvvError::Invalid));
    }

    #[test]
    fn test_cvv_debug_redacted() {
        let cvv = Cvv::parse("987").unwrap();
        assert_eq!(format!("{cvv:?}"), "Cvv([REDACTED])");
    }

    #[test]
    fn test_expiry_month_range() {
        assert_eq!(CardExpiry::new(0, 2030), Err(CardExpiryError::InvalidMonth(0)));
        assert_eq!(CardExpiry::new(13, 2030), Err(CardExpiryError::InvalidMonth(13)));
        assert!(CardExpiry::new(12, 2030).is_ok());
    }

    #[test]
    fn test_expiry_current_month_is_valid() {
        let expiry = CardExpiry::new(6, 2026).unwrap();
        assert!(!expiry.is_expired_on(date(2026, 6, 30)));
        assert!(expiry.is_expired_on(date(2026, 7, 1)));
    }

    #[test]
    fn test_expiry_past_year() {
        let expiry = CardExpiry::new(12, 2020).unwrap();
        assert_eq!(
            expiry.check_on(date(2026, 1, 15)),
            Err(CardExpiryError::Expired {
                month: 12,
                year: 2020
            })
        );
    }
}
