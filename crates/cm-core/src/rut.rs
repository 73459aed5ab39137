//! # RUT Newtypes
//!
//! [`TaxId`] is the Chilean Rol Único Tributario: a numeric body of up to
//! eight digits followed by a single verifier character. [`CheckDigit`] is
//! that verifier, restricted to `0-9` and `K`.
//!
//! ## Validation
//!
//! Both types validate at construction time. A `TaxId` in hand is always
//! well-formed. Whether its check digit is *correct* is a separate question
//! answered by [`validate`](crate::validate).
//!
//! Free-form user input (`"12.345.678-5"`, `"123456785"`, `" 7.608.642-8k "`)
//! goes through [`normalize`]. [`TaxId::new`] is the strict path for values
//! that are already split.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Largest number of digits a RUT body may have.
pub const MAX_BODY_LEN: usize = 8;

/// Modulus-11 weights, applied right to left and cycled.
const WEIGHTS: [u32; 6] = [2, 3, 4, 5, 6, 7];

/// A RUT verifier character: one of `0`-`9` or `K`.
///
/// Always stored and rendered in uppercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CheckDigit(char);

impl CheckDigit {
    /// The `K` verifier (modulus remainder 10).
    pub const K: CheckDigit = CheckDigit('K');

    /// The `0` verifier (modulus remainder 11).
    pub const ZERO: CheckDigit = CheckDigit('0');

    /// Parse a verifier character, case-insensitively.
    ///
    /// Returns `None` for anything other than `0-9`, `k` or `K`.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0'..='9' => Some(Self(c)),
            'k' | 'K' => Some(Self::K),
            _ => None,
        }
    }

    /// The verifier as an uppercase character.
    pub fn as_char(self) -> char {
        self.0
    }

    /// Whether this is the `K` verifier.
    pub fn is_k(self) -> bool {
        self.0 == 'K'
    }

    /// Map a modulus-11 remainder (`11 - sum % 11`, so `1..=11`) to its verifier.
    fn from_remainder(remainder: u32) -> Self {
        match remainder {
            11 => Self::ZERO,
            10 => Self::K,
            n => Self(char::from(b'0' + n as u8)),
        }
    }
}

impl fmt::Display for CheckDigit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A syntactically valid Chilean RUT.
///
/// The canonical text form is `<digits>-<check>` (e.g. `12345678-5`), which
/// is what [`Display`](fmt::Display) and serde produce. Use
/// [`formatted`](Self::formatted) for the dotted form shown to people.
///
/// # Invariants
///
/// - `digits` is 1 to [`MAX_BODY_LEN`] ASCII digits. Leading zeros are kept.
/// - `check_digit` is `0-9` or `K`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaxId {
    digits: String,
    check_digit: CheckDigit,
}

impl TaxId {
    /// Build a RUT from an already split body and verifier, without cleaning.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if `digits` is empty, non-numeric or too
    /// long, or if `check_digit` is not `0-9`/`K`.
    pub fn new(digits: impl Into<String>, check_digit: char) -> Result<Self, ValidationError> {
        let digits = digits.into();
        let input = format!("{digits}-{check_digit}");
        check_body(&digits, &input)?;
        let check_digit =
            CheckDigit::from_char(check_digit).ok_or(ValidationError::InvalidCheckDigit(input))?;
        Ok(Self {
            digits,
            check_digit,
        })
    }

    /// The numeric body, most significant digit first.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// The supplied verifier.
    pub fn check_digit(&self) -> CheckDigit {
        self.check_digit
    }

    /// The verifier the body actually calls for.
    pub fn expected_check_digit(&self) -> CheckDigit {
        modulus_11(&self.digits)
    }

    /// Dotted form with thousands separators: `12.345.678-5`.
    pub fn formatted(&self) -> String {
        let len = self.digits.len();
        let mut out = String::with_capacity(len + len / 3 + 2);
        for (i, c) in self.digits.chars().enumerate() {
            if i > 0 && (len - i) % 3 == 0 {
                out.push('.');
            }
            out.push(c);
        }
        out.push('-');
        out.push(self.check_digit.as_char());
        out
    }
}

impl fmt::Display for TaxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.digits, self.check_digit)
    }
}

impl FromStr for TaxId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl Serialize for TaxId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TaxId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

/// Clean free-form input into a [`TaxId`].
///
/// Everything except digits, `-` and `K`/`k` is dropped, and the check digit
/// is upper-cased. Input without a hyphen has one inserted before its last
/// character. The split happens at the last hyphen; any earlier hyphen stays
/// in the body and is rejected as non-numeric.
///
/// # Errors
///
/// Returns a [`ValidationError`] carrying the raw input when no body remains,
/// the body is non-numeric or longer than [`MAX_BODY_LEN`], or the check digit
/// is not exactly one `0-9`/`K`.
pub fn normalize(raw: &str) -> Result<TaxId, ValidationError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || c.eq_ignore_ascii_case(&'k'))
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // Without a hyphen the last character is the verifier. A lone character
    // leaves an empty body.
    let (body, check) = match cleaned.rsplit_once('-') {
        Some(split) => split,
        None => cleaned.split_at(cleaned.len().saturating_sub(1)),
    };

    check_body(body, raw)?;

    let mut chars = check.chars();
    let check_digit = match (chars.next(), chars.next()) {
        (Some(c), None) => CheckDigit::from_char(c),
        _ => None,
    }
    .ok_or_else(|| ValidationError::InvalidCheckDigit(raw.to_string()))?;

    Ok(TaxId {
        digits: body.to_string(),
        check_digit,
    })
}

/// Compute the modulus-11 verifier for a numeric body.
///
/// Digits are weighted right to left with 2, 3, 4, 5, 6, 7, 2, 3, …; the
/// verifier is `11 - (sum % 11)` with 11 mapped to `0` and 10 to `K`.
///
/// # Errors
///
/// Returns a [`ValidationError`] if `digits` is empty, non-numeric or longer
/// than [`MAX_BODY_LEN`].
pub fn compute_check_digit(digits: &str) -> Result<CheckDigit, ValidationError> {
    check_body(digits, digits)?;
    Ok(modulus_11(digits))
}

/// Body must be 1..=MAX_BODY_LEN ASCII digits. `input` is what gets reported.
fn check_body(body: &str, input: &str) -> Result<(), ValidationError> {
    if body.is_empty() {
        return Err(ValidationError::EmptyBody(input.to_string()));
    }
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::NonNumericBody(input.to_string()));
    }
    if body.len() > MAX_BODY_LEN {
        return Err(ValidationError::BodyTooLong {
            input: input.to_string(),
            len: body.len(),
            max: MAX_BODY_LEN,
        });
    }
    Ok(())
}

/// Caller guarantees `body` is ASCII digits.
fn modulus_11(body: &str) -> CheckDigit {
    let sum: u32 = body
        .bytes()
        .rev()
        .zip(WEIGHTS.iter().cycle())
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    CheckDigit::from_remainder(11 - sum % 11)
}
