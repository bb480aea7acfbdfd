//! Radix rule for numeric manifest fields.
//!
//! A value is hexadecimal iff its text starts with the literal prefix `0x`,
//! decimal otherwise. There is no octal, no `0X`, no sign and no digit
//! separators.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumberError {
    #[error("value is empty")]
    Empty,
    #[error("no hexadecimal digits after '0x'")]
    EmptyHex,
    #[error("'{0}' is not a valid {1} digit")]
    InvalidDigit(char, &'static str),
    #[error("value does not fit in {0} bits")]
    OutOfRange(u32),
}

/// Parse `text` under the `0x` radix rule. Surrounding whitespace is ignored.
pub fn parse_number(text: &str) -> Result<u64, NumberError> {
    let trimmed = text.trim();
    if let Some(digits) = trimmed.strip_prefix("0x") {
        if digits.is_empty() {
            return Err(NumberError::EmptyHex);
        }
        return parse_digits(digits, 16);
    }
    if trimmed.is_empty() {
        return Err(NumberError::Empty);
    }
    parse_digits(trimmed, 10)
}

/// Same as [`parse_number`], narrowed to `u32` (interrupt numbers).
pub fn parse_number_u32(text: &str) -> Result<u32, NumberError> {
    let value = parse_number(text)?;
    u32::try_from(value).map_err(|_| NumberError::OutOfRange(u32::BITS))
}

fn parse_digits(digits: &str, radix: u32) -> Result<u64, NumberError> {
    // from_str_radix tolerates a leading '+', the radix rule does not.
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        let kind = if radix == 16 { "hexadecimal" } else { "decimal" };
        return Err(NumberError::InvalidDigit(bad, kind));
    }
    u64::from_str_radix(digits, radix).map_err(|_| NumberError::OutOfRange(u64::BITS))
}
