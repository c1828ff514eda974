// crates/astra-core/src/token.rs
//
// Astra (ASTR) token amount type.
//
// The backend stores balances as plain numbers in ASTR. On the client every
// amount is held as integer "micro" (1 ASTR = 10^6 micro) so that balance
// checks never depend on floating-point comparison.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AstraError, ValidationError};

/// Number of micro in one ASTR. 1 ASTR = 10^6 micro.
pub const MICRO_PER_ASTR: u64 = 1_000_000;

/// An Astra token amount, in micro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Astra {
    /// Amount in micro (1 ASTR = 10^6 micro).
    pub micro: u64,
}

impl Astra {
    /// Create an amount from a whole number of ASTR.
    ///
    /// # Example
    /// ```
    /// use astra_core::token::Astra;
    /// assert_eq!(Astra::from_whole(300).micro, 300_000_000);
    /// ```
    pub const fn from_whole(astr: u64) -> Self {
        Self {
            micro: astr.saturating_mul(MICRO_PER_ASTR),
        }
    }

    /// Create an amount from a micro value.
    pub const fn from_micro(micro: u64) -> Self {
        Self { micro }
    }

    /// Convert a backend number (ASTR, possibly fractional) into an amount.
    ///
    /// Negative and non-finite values clamp to zero; sub-micro precision is
    /// rounded to the nearest micro.
    pub fn from_astr(value: f64) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::zero();
        }
        let micro = (value * MICRO_PER_ASTR as f64).round();
        if micro >= u64::MAX as f64 {
            Self { micro: u64::MAX }
        } else {
            Self { micro: micro as u64 }
        }
    }

    /// Convert to ASTR as a floating-point value, for the wire.
    pub fn to_astr(&self) -> f64 {
        self.micro as f64 / MICRO_PER_ASTR as f64
    }

    /// Parse a user-entered amount.
    ///
    /// Accepts an optional leading `+`, digits, and an optional fractional
    /// part of up to six digits. A longer fraction is rejected with
    /// [`ValidationError::TooManyDecimals`]; anything else, and zero, with
    /// [`ValidationError::InvalidAmount`].
    pub fn parse(input: &str) -> Result<Self, AstraError> {
        let invalid = || AstraError::Validation(ValidationError::InvalidAmount(input.trim().to_string()));

        let text = input.trim();
        let text = text.strip_prefix('+').unwrap_or(text);
        if text.is_empty() {
            return Err(invalid());
        }

        let (whole, frac) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 6 {
            return Err(ValidationError::TooManyDecimals(input.trim().to_string()).into());
        }

        let whole_value: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac_value: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<6}", frac);
            padded.parse().map_err(|_| invalid())?
        };

        let micro = whole_value
            .checked_mul(MICRO_PER_ASTR)
            .and_then(|m| m.checked_add(frac_value))
            .ok_or_else(invalid)?;

        if micro == 0 {
            return Err(invalid());
        }
        Ok(Self { micro })
    }

    /// Returns zero ASTR.
    pub const fn zero() -> Self {
        Self { micro: 0 }
    }

    /// Whether this amount is zero.
    pub fn is_zero(&self) -> bool {
        self.micro == 0
    }

    /// Checked addition; `None` on overflow.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.micro.checked_add(rhs.micro).map(Self::from_micro)
    }

    /// Checked subtraction; `None` if `rhs` is larger.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.micro.checked_sub(rhs.micro).map(Self::from_micro)
    }

    /// The amount without the unit suffix, e.g. `"1.5"`.
    pub fn amount_string(&self) -> String {
        let whole = self.micro / MICRO_PER_ASTR;
        let frac = self.micro % MICRO_PER_ASTR;
        if frac == 0 {
            whole.to_string()
        } else {
            let frac_str = format!("{:06}", frac);
            format!("{}.{}", whole, frac_str.trim_end_matches('0'))
        }
    }
}

impl fmt::Display for Astra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ASTR", self.amount_string())
    }
}
