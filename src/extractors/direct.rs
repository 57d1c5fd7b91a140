// Direct extractor - regex patterns over the whole note text
//
// Covers the Bovespa layouts (XP, Clear, Rico...) and the BTG futures
// tables. Patterns run over the full text first, then line by line, then
// over the "NEGÓCIOS REALIZADOS" section; the same trade found twice is
// kept once.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::futures::with_tail;
use super::NoteExtractor;
use crate::document::NoteDocument;
use crate::notes::metadata::parse_note_date;
use crate::notes::{self, BrokerageNote, Side, Trade};
use crate::tickers::ProductSet;
use crate::utils::{parse_amount, parse_brazilian_decimal, parse_quantity};

/// Which capture group holds which field
#[derive(Debug, Clone, Copy)]
struct Layout {
    /// `None` means every match is a buy
    side: Option<usize>,
    asset: usize,
    quantity: usize,
    price: usize,
    total: Option<usize>,
}

static TEXT_PATTERNS: Lazy<Vec<(Regex, Layout)>> = Lazy::new(|| {
    let stock = Layout {
        side: Some(1),
        asset: 2,
        quantity: 3,
        price: 4,
        total: Some(5),
    };
    [
        // 1-BOVESPA C VISTA PETR4 [ON N2] 100 38,50 3.850,00
        (
            r"\b([CV])\s+(?:VISTA|FRACION[AÁ]RIO|OP[CÇ][AÃ]O|TERMO)\s+([A-Z0-9]+)(?:\s+(?:ON|PN|PNA|PNB|UNT|UNIT|CI|N1|N2|NM|ED|EJ|EX))*\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)\s+([\d,.]+)",
            stock,
        ),
        // COMPRA AÇÕES PETR4 100 38,50 3.850,00
        (
            r"\b(COMPRA|VENDA)\s+(?:A[CÇ][OÕ]ES|OP[CÇ][OÕ]ES)\s+([A-Z0-9]+)\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)\s+([\d,.]+)",
            stock,
        ),
        // 12 C ON PETR4 100 38,50 3.850,00
        (
            r"\d+\s+([CV])\s+(?:ON|PN|UNIT)\s+([A-Z0-9]+)\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)\s+([\d,.]+)",
            stock,
        ),
        // WIN J25 FUTURO | COMPRA | 3 | 131.820,00
        (
            r"([A-Z0-9]+\s+[A-Z0-9]+)\s+(?:FUTURO|VISTA|OP[CÇ][AÃ]O|TERMO)\s*\|\s*(COMPRA|VENDA)\s*\|\s*(\d+(?:\.\d{3})*)\s*\|\s*([\d,.]+)",
            Layout {
                side: Some(2),
                asset: 1,
                quantity: 3,
                price: 4,
                total: None,
            },
        ),
        // WIN J25 FUTURO COMPRA 3 131.820,00
        (
            r"([A-Z0-9]+(?:\s+[A-Z0-9]+)?)\s+(?:FUTURO|VISTA|OP[CÇ][AÃ]O|TERMO)\s+(COMPRA|VENDA)\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)",
            Layout {
                side: Some(2),
                asset: 1,
                quantity: 3,
                price: 4,
                total: None,
            },
        ),
        // WINFUT WIN J25 3 131.820,00
        (
            r"(?:WINFUT|DOLFUT|INDFUT)\s+([A-Z0-9]+\s+[A-Z0-9]+)\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)",
            Layout {
                side: None,
                asset: 1,
                quantity: 2,
                price: 3,
                total: None,
            },
        ),
    ]
    .into_iter()
    .map(|(pattern, layout)| {
        (
            Regex::new(&format!("(?i){}", pattern)).expect("valid direct regex"),
            layout,
        )
    })
    .collect()
});

/// BTG futures row: `C WINJ25 16/04/2025 3 131.820,0000 DAY TRADE ...`
static BTG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([CV])\s+([A-Z][A-Z0-9]+)\s+(?:(\d{2}/\d{2}/\d{4})\s+)?(\d+)\s+([\d.,]*\d)")
        .expect("valid direct regex")
});

/// Row inside the trades section of an accent-folded note
static SECTION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([CV])\s+(?:(?:VISTA|FRACIONARIO|OPCAO|TERMO)\s+)?([A-Z0-9]+)\s+(\d+(?:\.\d{3})*)\s+([\d,.]+)")
        .expect("valid direct regex")
});

/// (start markers, end markers) of the trades section
const SECTIONS: &[(&[&str], &[&str])] = &[
    (
        &["NEGOCIOS REALIZADOS", "RESUMO DOS NEGOCIOS"],
        &["RESUMO FINANCEIRO", "CUSTOS"],
    ),
    (
        &["MERCADORIAS", "AJUSTE", "ESPECIFICACAO", "CONTRATOS"],
        &["RESUMO FINANCEIRO", "CUSTOS", "TOTAL"],
    ),
];

pub struct DirectExtractor {
    products: ProductSet,
}

impl DirectExtractor {
    pub fn new(products: ProductSet) -> Self {
        Self { products }
    }

    /// Build a trade, decomposing the asset when it is a known futures contract
    fn trade(&self, side: Side, asset: &str, quantity: Decimal, price: Decimal) -> Option<Trade> {
        if quantity <= Decimal::ZERO {
            return None;
        }
        let asset = asset.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();
        let trade = Trade::new(side, asset.as_str(), quantity, price)?;
        Some(match self.products.split_contract(&asset) {
            Some(ticker) => trade.with_futures(&ticker),
            None => trade,
        })
    }

    fn from_layout(&self, caps: &Captures<'_>, layout: Layout) -> Option<Trade> {
        let side = match layout.side {
            Some(group) => Side::parse(&caps[group])?,
            None => Side::Buy,
        };
        let quantity = parse_quantity(&caps[layout.quantity]).ok()?;
        let price = parse_brazilian_decimal(&caps[layout.price]).ok()?;
        let total = layout
            .total
            .map(|group| parse_amount(&caps[group]))
            .unwrap_or_default();
        Some(
            self.trade(side, &caps[layout.asset], quantity, price)?
                .with_total(total),
        )
    }

    fn text_trades(&self, text: &str) -> Vec<Trade> {
        TEXT_PATTERNS
            .iter()
            .flat_map(|(re, layout)| {
                re.captures_iter(text)
                    .filter_map(|caps| self.from_layout(&caps, *layout))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn btg_line_trade(&self, line: &str) -> Option<Trade> {
        let caps = BTG_LINE.captures(line)?;
        let side = Side::parse(&caps[1])?;
        let quantity = parse_quantity(&caps[4]).ok()?;
        let price = parse_brazilian_decimal(&caps[5]).ok()?;
        let mut trade = self.trade(side, &caps[2], quantity, price)?;
        if let Some(date) = caps.get(3).and_then(|m| parse_note_date(m.as_str())) {
            trade.maturity_date = Some(date);
        }
        Some(with_tail(trade, line, &caps))
    }

    /// Rows between the section markers of the folded text
    fn section_trades(&self, folded: &str) -> Vec<Trade> {
        let mut trades = Vec::new();
        for (starts, ends) in SECTIONS {
            let Some(section) = section_between(folded, starts, ends) else {
                continue;
            };
            trace!("trades section of {} characters", section.len());
            for line in section.lines() {
                let Some(caps) = SECTION_LINE.captures(line) else {
                    continue;
                };
                let (Some(side), Ok(quantity), Ok(price)) = (
                    Side::parse(&caps[1]),
                    parse_quantity(&caps[3]),
                    parse_brazilian_decimal(&caps[4]),
                ) else {
                    continue;
                };
                trades.extend(self.trade(side, &caps[2], quantity, price));
            }
        }
        trades
    }
}

/// Text after the first start marker up to the nearest end marker
fn section_between<'a>(text: &'a str, starts: &[&str], ends: &[&str]) -> Option<&'a str> {
    let (pos, marker) = starts
        .iter()
        .filter_map(|m| text.find(m).map(|pos| (pos, *m)))
        .min_by_key(|(pos, _)| *pos)?;
    let body = &text[pos + marker.len()..];
    let end = ends
        .iter()
        .filter_map(|m| body.find(m))
        .min()
        .unwrap_or(body.len());
    Some(&body[..end])
}

impl NoteExtractor for DirectExtractor {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn extract(&self, doc: &NoteDocument) -> Result<Option<BrokerageNote>> {
        let mut note = notes::skeleton(doc, self.name());

        let mut found = self.text_trades(&doc.text);
        found.extend(doc.lines().filter_map(|line| self.btg_line_trade(line)));
        found.extend(self.section_trades(&doc.folded_text()));

        for trade in found {
            note.push_trade(trade);
        }

        if note.trades.is_empty() && (!note.fees.is_empty() || note.number.is_some()) {
            debug!("{}: no trades, keeping note-level values", doc.file_name);
            note.trades.push(Trade::placeholder());
        }

        if !note.has_content() {
            return Ok(None);
        }
        Ok(Some(note))
    }
}
