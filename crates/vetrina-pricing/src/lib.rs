// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pricing for the Vetrina listing relay.
//!
//! Turns a free-form listing caption into structured fields, applies the
//! tiered markup of the active selling mode and renders the outbound caption.
//! Everything here is pure and synchronous.

pub mod caption;
pub mod extract;
pub mod formula;
pub mod mode;
pub mod number;

pub use caption::{CaptionTemplate, MISSING_PRICE_HINT, escape_html};
pub use extract::{ExtractedFields, FieldExtractor};
pub use formula::{FormulaError, HighTierRule, compute_final};
pub use mode::{ModeRegistry, SellingMode};
pub use number::{AMOUNT_PATTERN, parse_amount};

/// Result of pricing one caption.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub fields: ExtractedFields,
    pub final_price: u64,
    pub caption: String,
}

/// Extractor and active selling mode bundled for the relay pipeline.
#[derive(Debug, Clone)]
pub struct Pricer {
    extractor: FieldExtractor,
    mode: SellingMode,
}

impl Pricer {
    pub fn new(extractor: FieldExtractor, mode: SellingMode) -> Self {
        Self { extractor, mode }
    }

    pub fn mode(&self) -> &SellingMode {
        &self.mode
    }

    /// Prices a caption. `None` means no price could be found.
    pub fn quote(&self, text: &str) -> Option<Quote> {
        let fields = self.extractor.extract(text);
        let final_price = self.mode.final_price(&fields)?;
        let caption = self.mode.template.render(final_price, &fields);
        tracing::debug!(
            mode = %self.mode.name,
            price = ?fields.price,
            discount = fields.discount_percent,
            final_price,
            "caption priced"
        );
        Some(Quote {
            fields,
            final_price,
            caption,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Pricer {
        let mode = SellingMode {
            name: "standard".into(),
            high_tier: HighTierRule::PercentPlusFlat {
                percent: 10.0,
                add: 30.0,
            },
            template: CaptionTemplate::BoldBlock,
        };
        Pricer::new(FieldExtractor::default(), mode)
    }

    #[test]
    fn quotes_a_full_caption() {
        let quote = standard().quote("Jacket\n300€ -20%\nM/L\nNEW FW24/25").unwrap();
        assert_eq!(quote.final_price, 295);
        assert_eq!(
            quote.caption,
            "<b>295€ ✅</b>\n<b>Retail price 300€ ❌</b>\n<b>NEW FW24/25</b>\n<b>M/L</b>"
        );
    }

    #[test]
    fn high_band_scenario() {
        assert_eq!(standard().quote("650€ -35%").unwrap().final_price, 495);
        assert_eq!(standard().quote("900€ -10%").unwrap().final_price, 921);
    }

    #[test]
    fn unpriced_caption_has_no_quote() {
        assert!(standard().quote("DM for price").is_none());
    }
}
