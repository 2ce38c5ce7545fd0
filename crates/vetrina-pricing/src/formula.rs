// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered markup formula.
//!
//! The discounted price falls into one of three bands. The two lower bands
//! add a fixed fee; the upper band is selling-mode specific and written in the
//! operators' compact notation (`+90€`, `+10%+30€`, `-%+10%+30€`).

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Upper bound (inclusive) of the low band.
pub const LOW_BAND_LIMIT: f64 = 250.0;
/// Upper bound (inclusive) of the middle band.
pub const MID_BAND_LIMIT: f64 = 400.0;
/// Fee added in the low band.
pub const LOW_BAND_FEE: f64 = 55.0;
/// Fee added in the middle band.
pub const MID_BAND_FEE: f64 = 70.0;

static FORMULA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<sign>[+-])(?P<body>%|\d+(?:[.,]\d+)?%|\d+(?:[.,]\d+)?€)").unwrap()
});

/// Errors from parsing a high-band formula.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("unexpected input `{0}` in formula")]
    Unexpected(String),

    #[error("`-%` may only appear at the start of a formula")]
    MisplacedItemDiscount,

    #[error("formula may contain at most one percentage markup")]
    TooManyPercentages,

    #[error("formula has no markup after the item discount")]
    NoMarkup,
}

/// Markup applied above [`MID_BAND_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HighTierRule {
    /// `discounted + add`
    Flat(f64),
    /// `discounted × (1 + percent/100) + add`
    PercentPlusFlat { percent: f64, add: f64 },
}

impl HighTierRule {
    pub fn apply(&self, discounted: f64) -> f64 {
        match *self {
            HighTierRule::Flat(add) => discounted + add,
            HighTierRule::PercentPlusFlat { percent, add } => {
                discounted * (1.0 + percent / 100.0) + add
            }
        }
    }
}

impl FromStr for HighTierRule {
    type Err = FormulaError;

    /// Parses `+90€`, `+10%+30€` or `-%+10%+30€`. Whitespace is ignored and a
    /// leading `-%` (apply the item discount) is accepted as implied.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(FormulaError::Empty);
        }

        let mut cursor = 0;
        let mut percent: Option<f64> = None;
        let mut add = 0.0;
        let mut has_flat = false;

        for (index, caps) in FORMULA_TOKEN.captures_iter(&compact).enumerate() {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
            if whole.start != cursor {
                return Err(FormulaError::Unexpected(compact[cursor..whole.start].to_string()));
            }
            cursor = whole.end;

            let negative = &caps["sign"] == "-";
            let body = &caps["body"];
            if body == "%" {
                if index != 0 || !negative {
                    return Err(FormulaError::MisplacedItemDiscount);
                }
                continue;
            }

            let (number, is_percent) = match body.strip_suffix('%') {
                Some(number) => (number, true),
                None => (body.trim_end_matches('€'), false),
            };
            let value: f64 = number
                .replace(',', ".")
                .parse()
                .map_err(|_| FormulaError::Unexpected(body.to_string()))?;
            let value = if negative { -value } else { value };

            if is_percent {
                if percent.replace(value).is_some() {
                    return Err(FormulaError::TooManyPercentages);
                }
            } else {
                add += value;
                has_flat = true;
            }
        }

        if cursor != compact.len() {
            return Err(FormulaError::Unexpected(compact[cursor..].to_string()));
        }

        match (percent, has_flat) {
            (Some(percent), _) => Ok(HighTierRule::PercentPlusFlat { percent, add }),
            (None, true) => Ok(HighTierRule::Flat(add)),
            (None, false) => Err(FormulaError::NoMarkup),
        }
    }
}

impl fmt::Display for HighTierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            HighTierRule::Flat(add) => write!(f, "-%{add:+}€"),
            HighTierRule::PercentPlusFlat { percent, add } => {
                write!(f, "-%{percent:+}%{add:+}€")
            }
        }
    }
}

/// `price × (100 − discount) / 100`, with the discount clamped to `0..=100`.
pub fn discounted(price: f64, discount_percent: f64) -> f64 {
    let discount = discount_percent.clamp(0.0, 100.0);
    price.max(0.0) * (100.0 - discount) / 100.0
}

/// Slack for binary noise. Far below a cent, so any real remainder still
/// rounds up.
const FLOAT_NOISE: f64 = 1e-9;

/// Rounds up to a whole unit.
pub fn ceil_currency(value: f64) -> u64 {
    (value.max(0.0) - FLOAT_NOISE).ceil().max(0.0) as u64
}

/// Final sale price for a source price and discount.
pub fn compute_final(price: f64, discount_percent: f64, high_tier: &HighTierRule) -> u64 {
    let discounted = discounted(price, discount_percent);
    let marked_up = if discounted <= LOW_BAND_LIMIT + FLOAT_NOISE {
        discounted + LOW_BAND_FEE
    } else if discounted <= MID_BAND_LIMIT + FLOAT_NOISE {
        discounted + MID_BAND_FEE
    } else {
        high_tier.apply(discounted)
    };
    ceil_currency(marked_up)
}
