// Basic extractor - last resort for unknown layouts
//
// One loose pattern: side, two words, quantity, price and total. When the
// first word is a market column ("VISTA") the asset is the second one.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use super::NoteExtractor;
use crate::document::NoteDocument;
use crate::notes::{self, BrokerageNote, Side, Trade};
use crate::utils::{parse_amount, parse_brazilian_decimal, parse_quantity};

static LOOSE_TRADE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([CV])\s+(\w+)\s+(\w+)\s+(\d+)\s+([\d,.]+)\s+([\d,.]+)")
        .expect("valid basic regex")
});

const MARKET_WORDS: &[&str] = &[
    "VISTA", "FRACIONARIO", "OPCAO", "TERMO", "FUTURO", "ON", "PN", "UNIT",
];

pub struct BasicExtractor;

impl NoteExtractor for BasicExtractor {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn extract(&self, doc: &NoteDocument) -> Result<Option<BrokerageNote>> {
        let mut note = notes::skeleton(doc, self.name());

        for caps in LOOSE_TRADE.captures_iter(&doc.text) {
            let Some(side) = Side::parse(&caps[1]) else {
                continue;
            };
            let first = caps[2].to_uppercase();
            let asset = if MARKET_WORDS.contains(&first.as_str()) {
                caps[3].to_string()
            } else {
                first
            };
            let (Ok(quantity), Ok(price)) =
                (parse_quantity(&caps[4]), parse_brazilian_decimal(&caps[5]))
            else {
                continue;
            };
            if quantity <= Decimal::ZERO {
                continue;
            }
            let Some(trade) = Trade::new(side, asset.to_uppercase(), quantity, price) else {
                continue;
            };
            note.push_trade(trade.with_total(parse_amount(&caps[6])));
        }

        if !note.has_content() {
            return Ok(None);
        }
        Ok(Some(note))
    }
}
