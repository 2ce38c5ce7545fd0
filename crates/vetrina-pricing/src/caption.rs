// SPDX-FileCopyrightText: 2026 Vetrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML caption layouts for published posts.

use vetrina_config::model::TemplateKind;

use crate::extract::ExtractedFields;
use crate::formula::ceil_currency;

/// Reply sent to the source conversation when a media post has no price.
pub const MISSING_PRICE_HINT: &str =
    "Could not find a price in this post. Send the price and discount as text, e.g. 300€ -20%";

/// Caption layout of a selling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionTemplate {
    /// Every line bold: final price, retail price, season, sizes.
    BoldBlock,
    /// Marker-prefixed bold prices, then sizes and season in plain text.
    Compact,
}

impl From<TemplateKind> for CaptionTemplate {
    fn from(kind: TemplateKind) -> Self {
        match kind {
            TemplateKind::BoldBlock => CaptionTemplate::BoldBlock,
            TemplateKind::Compact => CaptionTemplate::Compact,
        }
    }
}

impl CaptionTemplate {
    /// Renders the caption for a priced listing. Empty size/season lines are omitted.
    pub fn render(&self, final_price: u64, fields: &ExtractedFields) -> String {
        let retail = ceil_currency(fields.reference_price);
        let size = fields.size.as_deref().map(escape_html);
        let season = fields.season.as_deref().map(escape_html);

        let mut lines = Vec::with_capacity(4);
        match self {
            CaptionTemplate::BoldBlock => {
                lines.push(format!("<b>{final_price}€ ✅</b>"));
                lines.push(format!("<b>Retail price {retail}€ ❌</b>"));
                lines.extend(season.map(|s| format!("<b>{s}</b>")));
                lines.extend(size.map(|s| format!("<b>{s}</b>")));
            }
            CaptionTemplate::Compact => {
                lines.push(format!("✅ <b>{final_price}€</b>"));
                lines.push(format!("❌ <b>Retail price {retail}€</b>"));
                lines.extend(size);
                lines.extend(season);
            }
        }
        lines.join("\n")
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
