//! ISBN-10 / ISBN-13 normalization and checksum validation.
//!
//! [`validate`] is total and side-effect free: every input string yields
//! either a canonical [`Isbn`] or an [`IsbnError`] naming the first rule the
//! input failed.

use crate::validation::{ValidationResult, Validator};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Why an ISBN was rejected. Display texts are the user-facing diagnostics.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsbnError {
    #[error("ISBN is required")]
    Required,

    #[error("ISBN is invalid")]
    InvalidFormat,

    #[error("ISBN is invalid")]
    InvalidChecksum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IsbnKind {
    Isbn10,
    Isbn13,
}

/// A checksum-verified ISBN in canonical form: no hyphens or spaces, and an
/// upper-case `X` check character for ISBN-10.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Isbn {
    value: String,
    kind: IsbnKind,
}

impl Isbn {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> IsbnKind {
        self.kind
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate(s)
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

fn isbn10_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^[0-9]{9}[0-9Xx]$").expect("ISBN-10 pattern compiles"))
}

fn isbn13_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| Regex::new(r"^[0-9]{13}$").expect("ISBN-13 pattern compiles"))
}

/// Strip hyphens and spaces, then surrounding whitespace. Does not validate.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Classify, checksum-verify and canonicalize a raw ISBN.
pub fn validate(raw: &str) -> Result<Isbn, IsbnError> {
    if raw.trim().is_empty() {
        return Err(IsbnError::Required);
    }

    let clean = normalize(raw);

    if isbn10_shape().is_match(&clean) {
        if !isbn10_checksum_ok(clean.as_bytes()) {
            return Err(IsbnError::InvalidChecksum);
        }
        return Ok(Isbn {
            value: clean.to_ascii_uppercase(),
            kind: IsbnKind::Isbn10,
        });
    }

    if isbn13_shape().is_match(&clean) {
        if !isbn13_checksum_ok(clean.as_bytes()) {
            return Err(IsbnError::InvalidChecksum);
        }
        return Ok(Isbn {
            value: clean,
            kind: IsbnKind::Isbn13,
        });
    }

    Err(IsbnError::InvalidFormat)
}

/// Canonical form of `raw` if it is a valid ISBN, otherwise its plain
/// normalization. Used as the uniqueness key.
pub fn canonical_key(raw: &str) -> String {
    match validate(raw) {
        Ok(isbn) => isbn.into_string(),
        Err(_) => normalize(raw),
    }
}

fn digit(b: u8) -> u32 {
    u32::from(b - b'0')
}

// Caller guarantees the ISBN-10 shape.
fn isbn10_checksum_ok(isbn: &[u8]) -> bool {
    let mut sum: u32 = isbn[..9]
        .iter()
        .enumerate()
        .map(|(i, b)| digit(*b) * (10 - i as u32))
        .sum();

    sum += match isbn[9] {
        b'X' | b'x' => 10,
        b => digit(b),
    };

    sum % 11 == 0
}

// Caller guarantees the ISBN-13 shape.
fn isbn13_checksum_ok(isbn: &[u8]) -> bool {
    let sum: u32 = isbn[..12]
        .iter()
        .enumerate()
        .map(|(i, b)| digit(*b) * if i % 2 == 0 { 1 } else { 3 })
        .sum();

    let check = (10 - sum % 10) % 10;
    check == digit(isbn[12])
}

/// [`Validator`] adapter over [`validate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IsbnValidator;

impl Validator<str> for IsbnValidator {
    fn validate(&self, value: &str) -> ValidationResult {
        let mut result = ValidationResult::new();
        if let Err(reason) = validate(value) {
            result.push(reason.to_string());
        }
        result
    }
}
