// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured field extraction from free-form listing captions.
//!
//! Captions are written by hand and copied between channels, so every rule
//! here is a heuristic. Nothing fails: a field that cannot be found is simply
//! absent. A missing price means the post cannot be priced.

use std::sync::LazyLock;

use regex::Regex;

use crate::number::{AMOUNT_PATTERN as AMOUNT, parse_amount};

/// `300€ -20%`, `1.250,50 EUR - 15 %`, `300 -20%`.
static PRICE_DISCOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?P<price>{AMOUNT})\s*(?:€|\beuros?\b|\beur\b)?\s*[-−–]\s*(?P<disc>\d{{1,2}}(?:[.,]\d+)?)\s*%"
    ))
    .unwrap()
});

/// A currency-marked amount without an attached discount.
static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?P<a>{AMOUNT})\s*(?:€|\beuros?\b|\beur\b)|(?:€|\beur\b|\beuro\b)\s*(?P<b>{AMOUNT})"
    ))
    .unwrap()
});

static LONE_DISCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-−–]\s*(?P<disc>\d{1,2}(?:[.,]\d+)?)\s*%").unwrap());

static REFERENCE_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:retail|reference|rrp)(?:\s+price)?\s*[:\-]?\s*(?:€\s*)?(?P<ref>{AMOUNT})"
    ))
    .unwrap()
});

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w[\w-]*").unwrap());

static HANDLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@\w+").unwrap());

/// Lines that talk about money; a bare number next to one is not a size.
static PRICE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)€|%|\beuros?\b|\beur\b|\bprice\b|\bprezzo\b|цена").unwrap()
});

static SIZE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:sizes?|taglie|taglia|размеры?)\s*:?\s*").unwrap());

static ALPHA_SIZES: LazyLock<Regex> = LazyLock::new(|| {
    let token = r"(?:XXXL|XXL|XXS|XS|XL|S|M|L)";
    Regex::new(&format!(r"(?i)^{token}(?:\s*[/,\-–\s]\s*{token})*$")).unwrap()
});

static NUMERIC_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,2}(?:\.5)?(?:\s*[/,]\s*\d{1,2}(?:\.5)?)+$").unwrap()
});

static NUMERIC_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,2}(?:\.5)?\s*[-–]\s*\d{1,2}(?:\.5)?$").unwrap());

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2})$").unwrap());

static NEW_SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnew\s*(?P<code>FW|SS|AW)\s*(?P<y1>\d{2}(?:\d{2})?)(?:\s*/\s*(?P<y2>\d{2}(?:\d{2})?))?\b")
        .unwrap()
});

static SEASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?P<code>FW|SS|AW)\s*(?P<y1>\d{2}(?:\d{2})?)(?:\s*/\s*(?P<y2>\d{2}(?:\d{2})?))?\b")
        .unwrap()
});

/// Fields recovered from one caption.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    /// Primary (source) price. `None` means the post cannot be priced.
    pub price: Option<f64>,
    /// Discount in percent, `0.0` when none was written.
    pub discount_percent: f64,
    /// Explicit reference price, else the primary price, else `0.0`.
    pub reference_price: f64,
    pub size: Option<String>,
    pub season: Option<String>,
}

impl ExtractedFields {
    pub fn is_priceable(&self) -> bool {
        self.price.is_some()
    }
}

/// Caption parser with configurable noise words.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    noise: Option<Regex>,
}

impl FieldExtractor {
    /// Creates an extractor that also strips the given words (case-insensitive).
    pub fn new(noise_words: &[String]) -> Self {
        let words: Vec<String> = noise_words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();
        let noise = if words.is_empty() {
            None
        } else {
            Regex::new(&format!(r"(?i)\b(?:{})\b", words.join("|"))).ok()
        };
        Self { noise }
    }

    /// Extracts price, discount, reference price, size, and season.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let cleaned = self.strip_decorations(text);

        let mut fields = ExtractedFields::default();

        if let Some(caps) = PRICE_DISCOUNT.captures(&cleaned)
            && let Some(price) = parse_amount(&caps["price"])
        {
            fields.price = Some(price);
            fields.discount_percent = parse_percent(&caps["disc"]);
        } else if let Some(price) = first_currency_amount(&cleaned) {
            fields.price = Some(price);
            fields.discount_percent = LONE_DISCOUNT
                .captures(&cleaned)
                .map(|c| parse_percent(&c["disc"]))
                .unwrap_or(0.0);
        }

        fields.reference_price = REFERENCE_PRICE
            .captures(&cleaned)
            .and_then(|c| parse_amount(&c["ref"]))
            .or(fields.price)
            .unwrap_or(0.0);

        fields.season = find_season(&cleaned);
        fields.size = find_size(&cleaned);
        fields
    }

    fn strip_decorations(&self, text: &str) -> String {
        let text = HASHTAG.replace_all(text, "");
        let text = HANDLE.replace_all(&text, "");
        match &self.noise {
            Some(noise) => noise.replace_all(&text, "").into_owned(),
            None => text.into_owned(),
        }
    }
}

fn parse_percent(raw: &str) -> f64 {
    raw.replace(',', ".").parse::<f64>().unwrap_or(0.0).clamp(0.0, 100.0)
}

fn first_currency_amount(text: &str) -> Option<f64> {
    CURRENCY_AMOUNT.captures_iter(text).find_map(|caps| {
        let raw = caps.name("a").or_else(|| caps.name("b"))?;
        parse_amount(raw.as_str())
    })
}

fn find_season(text: &str) -> Option<String> {
    let (prefix, caps) = match NEW_SEASON.captures(text) {
        Some(caps) => ("NEW ", caps),
        None => ("", SEASON.captures(text)?),
    };
    let mut season = format!("{prefix}{}{}", caps["code"].to_uppercase(), &caps["y1"]);
    if let Some(y2) = caps.name("y2") {
        season.push('/');
        season.push_str(y2.as_str());
    }
    Some(season)
}

/// Finds the size line. List, range, and letter-size lines win; a lone number
/// counts only in a plausible size range and away from price lines.
fn find_size(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let candidates: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !PRICE_LINE.is_match(line))
        .map(|(i, line)| (i, strip_size_prefix(line)))
        .collect();

    if let Some((_, body)) = candidates.iter().find(|(_, body)| {
        ALPHA_SIZES.is_match(body) || NUMERIC_LIST.is_match(body) || NUMERIC_RANGE.is_match(body)
    }) {
        return Some(normalize_size(body));
    }

    candidates.iter().find_map(|&(i, body)| {
        let caps = BARE_NUMBER.captures(body)?;
        let value: u32 = caps[1].parse().ok()?;
        let plausible = (30..=46).contains(&value) || (1..=6).contains(&value);
        let near_price = [i.checked_sub(1), Some(i + 1)]
            .into_iter()
            .flatten()
            .filter_map(|j| lines.get(j))
            .any(|neighbour| PRICE_LINE.is_match(neighbour));
        (plausible && !near_price).then(|| value.to_string())
    })
}

fn strip_size_prefix(line: &str) -> &str {
    SIZE_PREFIX
        .find(line)
        .map(|m| &line[m.end()..])
        .unwrap_or(line)
}

fn normalize_size(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.contains(['/', '-', '–']) {
        collapsed.replace(' ', "").to_uppercase()
    } else {
        collapsed.to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> ExtractedFields {
        FieldExtractor::default().extract(text)
    }

    #[test]
    fn price_and_discount() {
        let f = extract("300€ -20%");
        assert_eq!(f.price, Some(300.0));
        assert_eq!(f.discount_percent, 20.0);
        assert_eq!(f.reference_price, 300.0);
    }

    #[test]
    fn spaced_currency_word_and_separators() {
        let f = extract("Prada bag\n1.250,50 EUR - 15 %");
        assert_eq!(f.price, Some(1250.5));
        assert_eq!(f.discount_percent, 15.0);
    }

    #[test]
    fn price_without_discount() {
        let f = extract("Coat\n480€");
        assert_eq!(f.price, Some(480.0));
        assert_eq!(f.discount_percent, 0.0);
    }

    #[test]
    fn separate_discount_line() {
        let f = extract("€ 520\nsale -30%");
        assert_eq!(f.price, Some(520.0));
        assert_eq!(f.discount_percent, 30.0);
    }

    #[test]
    fn explicit_reference_price() {
        let f = extract("Retail price 650€\n520€ -10%");
        assert_eq!(f.price, Some(520.0));
        assert_eq!(f.reference_price, 650.0);
    }

    #[test]
    fn no_price_is_not_an_error() {
        let f = extract("Beautiful jacket, DM for details");
        assert!(!f.is_priceable());
        assert_eq!(f.reference_price, 0.0);
        assert_eq!(f.discount_percent, 0.0);
    }

    #[test]
    fn alpha_sizes_line() {
        let f = extract("Jacket\n300€ -20%\nS / M / L");
        assert_eq!(f.size.as_deref(), Some("S/M/L"));
    }

    #[test]
    fn size_prefix_is_dropped() {
        let f = extract("300€ -20%\nSizes: xs, s, m");
        assert_eq!(f.size.as_deref(), Some("XS, S, M"));
    }

    #[test]
    fn numeric_list_and_range() {
        assert_eq!(extract("38/39/40").size.as_deref(), Some("38/39/40"));
        assert_eq!(extract("Sneakers\n36 - 41").size.as_deref(), Some("36-41"));
    }

    #[test]
    fn bare_number_in_range_is_a_size() {
        let f = extract("Boots\n\n39\n\nFW24");
        assert_eq!(f.size.as_deref(), Some("39"));
    }

    #[test]
    fn bare_number_next_to_price_line_is_noise() {
        let f = extract("Boots\n300€ -20%\n39");
        assert_eq!(f.size, None);
    }

    #[test]
    fn implausible_bare_number_is_not_a_size() {
        assert_eq!(extract("Bag\n12").size, None);
        assert_eq!(extract("Bag\n50").size, None);
    }

    #[test]
    fn new_season_beats_bare_season() {
        let f = extract("SS24 stock\nnew fw 24/25");
        assert_eq!(f.season.as_deref(), Some("NEW FW24/25"));
    }

    #[test]
    fn bare_season() {
        assert_eq!(extract("Coat SS25").season.as_deref(), Some("SS25"));
    }

    #[test]
    fn hashtags_and_handles_are_stripped() {
        let f = extract("#sale @julia_shop 300€ -20%");
        assert_eq!(f.price, Some(300.0));
        assert_eq!(f.discount_percent, 20.0);
    }

    #[test]
    fn noise_words_are_stripped() {
        let extractor = FieldExtractor::new(&["женское".to_string()]);
        let f = extractor.extract("женское\nM/L\n300€ -20%");
        assert_eq!(f.size.as_deref(), Some("M/L"));
    }

    #[test]
    fn thousands_separator_variants_agree() {
        let dot = extract("1.200€ -10%");
        let comma = extract("1,200€ -10%");
        assert_eq!(dot.price, Some(1200.0));
        assert_eq!(dot.price, comma.price);
    }
}
