//! CPU quantity parsing.
//!
//! Kubernetes writes CPU amounts either in millicores (`"250m"`) or in
//! decimal cores (`"0.25"`, `"2"`). Both normalize to [`Millicores`].

use std::fmt;
use thiserror::Error;

/// A CPU amount in thousandths of a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Millicores(pub u64);

impl Millicores {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Millicores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A CPU quantity in a lexical form this tool does not understand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized CPU quantity {text:?}: {reason}")]
pub struct QuantityError {
    pub text: String,
    pub reason: &'static str,
}

impl QuantityError {
    fn malformed(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }
}

/// Parse a CPU quantity into millicores.
///
/// Accepts `<digits>m` and `<digits>[.<digits>]`. Fractional digits past the
/// third are truncated.
pub fn parse_cpu(text: &str) -> Result<Millicores, QuantityError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(QuantityError::malformed(text, "empty"));
    }

    if let Some(digits) = trimmed.strip_suffix('m') {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(QuantityError::malformed(text, "milli form must be an integer"));
        }
        return digits
            .parse::<u64>()
            .map(Millicores)
            .map_err(|_| QuantityError::malformed(text, "out of range"));
    }

    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(QuantityError::malformed(text, "no digits"));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(QuantityError::malformed(text, "expected decimal cores or millicores"));
    }

    let cores = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| QuantityError::malformed(text, "out of range"))?
    };

    // Pad or cut the fraction to exactly three digits
    let milli_digits: String = fraction.chars().chain("000".chars()).take(3).collect();
    let milli = milli_digits
        .parse::<u64>()
        .map_err(|_| QuantityError::malformed(text, "out of range"))?;

    cores
        .checked_mul(1000)
        .and_then(|m| m.checked_add(milli))
        .map(Millicores)
        .ok_or_else(|| QuantityError::malformed(text, "out of range"))
}
