// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Locale-tolerant amount parsing.
//!
//! Sellers write `1.250`, `1,250`, `1.250,50` and `1,250.50` for the same
//! kind of value. The last separator decides its own meaning: followed by
//! exactly three digits it groups thousands, followed by one or two digits it
//! starts the decimals. Every earlier separator is a thousands separator.

/// Regex body of an amount: digits with optional `.`/`,` groups. Feed the
/// match to [`parse_amount`].
pub const AMOUNT_PATTERN: &str = r"\d(?:[\d.,]*\d)?";

/// Parses an amount written with `.`/`,` separators. Whitespace is ignored.
///
/// Returns `None` for empty input, stray characters, or a last group that is
/// neither a thousands group nor a decimal part.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty()
        || !compact
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let Some(last_sep) = compact.rfind(['.', ',']) else {
        return compact.parse().ok();
    };

    let (head, tail) = compact.split_at(last_sep);
    let tail = &tail[1..];
    let head_digits: String = head.chars().filter(char::is_ascii_digit).collect();
    if head_digits.is_empty() || tail.contains(['.', ',']) {
        return None;
    }

    match tail.len() {
        3 => format!("{head_digits}{tail}").parse().ok(),
        1 | 2 => format!("{head_digits}.{tail}").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_amount("300"), Some(300.0));
    }

    #[test]
    fn three_digit_tail_is_thousands() {
        assert_eq!(parse_amount("1.250"), Some(1250.0));
        assert_eq!(parse_amount("1,250"), Some(1250.0));
        assert_eq!(parse_amount("1.250.000"), Some(1_250_000.0));
    }

    #[test]
    fn short_tail_is_decimal() {
        assert_eq!(parse_amount("12,5"), Some(12.5));
        assert_eq!(parse_amount("99.90"), Some(99.9));
    }

    #[test]
    fn mixed_separators() {
        assert_eq!(parse_amount("1.250,50"), Some(1250.5));
        assert_eq!(parse_amount("1,250.50"), Some(1250.5));
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(parse_amount(" 1 250 "), Some(1250.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("12a"), None);
        assert_eq!(parse_amount(",50"), None);
        assert_eq!(parse_amount("1.2345"), None);
        assert_eq!(parse_amount("10."), None);
    }
}
