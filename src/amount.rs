//! Token amounts with a declared number of decimal places.

use crate::error::ConsoleError;
use std::fmt;

/// An amount held as an integer count of base units.
///
/// `TokenAmount { value: 1050, decimals: 2 }` is `10.50` tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAmount {
    pub value: i128,
    pub decimals: u8,
}

impl TokenAmount {
    /// Largest precision the console accepts (10^38 still fits an i128).
    pub const MAX_DECIMALS: u8 = 38;

    pub fn new(value: i128, decimals: u8) -> Self {
        TokenAmount { value, decimals }
    }

    /// Parses a decimal literal such as `10`, `-3.25` or `0.5`.
    ///
    /// Fails when the literal has more significant fractional digits than
    /// `decimals` allows; trailing fractional zeros do not count.
    pub fn parse(literal: &str, decimals: u8) -> Result<Self, ConsoleError> {
        let invalid = |reason: &str| {
            ConsoleError::InvalidInput(format!("Incorrect amount format '{}': {}", literal, reason))
        };

        if decimals > Self::MAX_DECIMALS {
            return Err(invalid("declared precision is too large"));
        }

        let trimmed = literal.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid("no digits"));
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("not a decimal number"));
        }

        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() > decimals as usize {
            return Err(invalid(&format!(
                "fractional part exceeds declared precision of {} decimal places",
                decimals
            )));
        }

        let scale = 10i128.pow(decimals as u32);
        let overflow = || invalid("value out of range");

        let int_value = if int_part.is_empty() {
            0
        } else {
            int_part.parse::<i128>().map_err(|_| overflow())?
        };
        let frac_value = if frac_part.is_empty() {
            0
        } else {
            let digits = frac_part.parse::<i128>().map_err(|_| overflow())?;
            digits * 10i128.pow((decimals as usize - frac_part.len()) as u32)
        };

        let magnitude = int_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(overflow)?;

        Ok(TokenAmount {
            value: if negative { -magnitude } else { magnitude },
            decimals,
        })
    }

    /// Like [`parse`](Self::parse) but also rejects zero and negative amounts.
    pub fn parse_positive(literal: &str, decimals: u8) -> Result<Self, ConsoleError> {
        let amount = Self::parse(literal, decimals)?;
        if amount.value <= 0 {
            return Err(ConsoleError::InvalidInput(format!(
                "Incorrect amount format '{}': amount must be positive",
                literal
            )));
        }
        Ok(amount)
    }

    pub fn is_positive(&self) -> bool {
        self.value > 0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.value);
        }
        let scale = 10i128.pow(self.decimals as u32);
        let sign = if self.value < 0 { "-" } else { "" };
        let abs = self.value.unsigned_abs();
        let scale = scale as u128;
        let frac = format!("{:0width$}", abs % scale, width = self.decimals as usize);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{}{}", sign, abs / scale)
        } else {
            write!(f, "{}{}.{}", sign, abs / scale, frac)
        }
    }
}
