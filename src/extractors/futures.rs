// Futures extractor - BM&F notes (WIN, WDO, DOL, IND, DI1...)
//
// Lines look like:
//   C WDO F25 02/01/2025 1 6.088,0000 DAY TRADE 12,00 D 0,00
//   V WINJ25 16/04/2025 3 131.958,0000 DAY TRADE 82,80 C 0,00
// i.e. side, contract (split or glued), optional expiry date, quantity,
// price, then the optional trade kind, operation value, D/C flag and
// operational fee.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rust_decimal::Decimal;
use tracing::{debug, trace};

use super::NoteExtractor;
use crate::document::NoteDocument;
use crate::notes::metadata::parse_note_date;
use crate::notes::{self, BrokerageNote, DebitCredit, Side, Trade, TradeKind};
use crate::tickers::{FuturesTicker, Maturity, ProductSet};
use crate::utils::parse_brazilian_decimal;

/// `C WDO F25 [02/01/2025] 1 6.088,0000`
static SPLIT_CONTRACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([CV])\s+([A-Z][A-Z0-9]{1,4})\s+([FGHJKMNQUVXZ]\d{1,2})\s+(?:(\d{2}/\d{2}/\d{4})\s+)?(\d+)\s+([\d.,]*\d)",
    )
    .expect("valid futures regex")
});

/// `C WDOK23 [31/05/2023] 10 5.278,50`
static GLUED_CONTRACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b([CV])\s+([A-Z][A-Z0-9]*[FGHJKMNQUVXZ]\d{2})\s+(?:(\d{2}/\d{2}/\d{4})\s+)?(\d+)\s+([\d.,]*\d)",
    )
    .expect("valid futures regex")
});

/// Table rows that kept the `C/V` header glued to the side
static SLASHED_SIDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([CV])/[VC]\s+([A-Z0-9]+)\s+([FGHJKMNQUVXZ]\d{1,2})\s+(\d+)\s+([\d.,]*\d)")
        .expect("valid futures regex")
});

/// What follows the price: kind, operation value, D/C, operational fee
static TRADE_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(DAY\s*TRADE|NORMAL)?\s*(?:([\d.,]*\d)\s+([CD])\b(?:\s+([\d.,]*\d))?)?",
    )
    .expect("valid futures regex")
});

/// Market columns of stock rows; such lines are never futures
const STOCK_MARKETS: &[&str] = &["VISTA", "FRACIONARIO", "OPCAO", "OPÇÃO", "TERMO"];

static MATURITY_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[FGHJKMNQUVXZ]\d{1,2}$").expect("valid futures regex"));
static INTEGER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("valid futures regex"));
static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\d.,]*\d$").expect("valid futures regex"));

pub struct FuturesExtractor {
    products: ProductSet,
}

impl FuturesExtractor {
    pub fn new(products: ProductSet) -> Self {
        Self { products }
    }

    /// Parse one note line into a futures trade
    pub fn parse_line(&self, line: &str) -> Option<Trade> {
        self.parse_split(line)
            .or_else(|| self.parse_glued(line))
            .or_else(|| self.parse_generic(line))
    }

    fn parse_split(&self, line: &str) -> Option<Trade> {
        let caps = SPLIT_CONTRACT.captures(line)?;
        let ticker = FuturesTicker {
            product: caps[2].to_uppercase(),
            maturity: Maturity::parse(&caps[3])?,
        };
        let trade = build_trade(&caps, &ticker.to_string(), &ticker, 4, 5, 6)?;
        Some(with_tail(trade, line, &caps))
    }

    fn parse_glued(&self, line: &str) -> Option<Trade> {
        let caps = GLUED_CONTRACT.captures(line)?;
        let code = caps[2].to_uppercase();
        let ticker = self.products.split_contract(&code)?;
        let trade = build_trade(&caps, &code, &ticker, 3, 4, 5)?;
        Some(with_tail(trade, line, &caps))
    }

    /// Last resort for layouts with extra columns between the fields: a
    /// contract (glued, or a bare product followed by its maturity) plus a
    /// side token, then the first integer and the next number after the side
    fn parse_generic(&self, line: &str) -> Option<Trade> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens
            .iter()
            .any(|t| STOCK_MARKETS.contains(&t.to_uppercase().as_str()))
        {
            return None;
        }
        let ticker = self.contract_in_tokens(&tokens)?;

        let side_idx = tokens
            .iter()
            .position(|t| t.eq_ignore_ascii_case("C") || t.eq_ignore_ascii_case("V"))?;
        let side = Side::parse(tokens[side_idx])?;

        let rest = &tokens[side_idx + 1..];
        let qty_idx = rest.iter().position(|t| INTEGER_TOKEN.is_match(t))?;
        let price_token = rest[qty_idx + 1..]
            .iter()
            .find(|t| NUMBER_TOKEN.is_match(t))?;

        let quantity = parse_brazilian_decimal(rest[qty_idx]).ok()?;
        let price = parse_brazilian_decimal(price_token).ok()?;
        if quantity <= Decimal::ZERO {
            return None;
        }

        Trade::new(side, ticker.to_string(), quantity, price).map(|t| t.with_futures(&ticker))
    }

    /// First token naming a contract. A bare product only counts when the
    /// next token is a maturity, so words like `B3` in a header do not.
    fn contract_in_tokens(&self, tokens: &[&str]) -> Option<FuturesTicker> {
        tokens.iter().enumerate().find_map(|(idx, token)| {
            if let Some(ticker) = self.products.split_contract(token) {
                return Some(ticker);
            }
            let product = self.products.product_in_token(token)?;
            let next = tokens.get(idx + 1).filter(|t| MATURITY_TOKEN.is_match(t))?;
            Some(FuturesTicker {
                product: product.to_string(),
                maturity: Maturity::parse(next)?,
            })
        })
    }

    fn parse_slashed_side(&self, line: &str) -> Option<Trade> {
        let caps = SLASHED_SIDE.captures(line)?;
        let ticker = FuturesTicker {
            product: caps[2].to_uppercase(),
            maturity: Maturity::parse(&caps[3])?,
        };
        let side = Side::parse(&caps[1])?;
        let quantity = parse_brazilian_decimal(&caps[4]).ok()?;
        let price = parse_brazilian_decimal(&caps[5]).ok()?;
        if quantity <= Decimal::ZERO {
            return None;
        }
        Trade::new(side, ticker.to_string(), quantity, price).map(|t| t.with_futures(&ticker))
    }

    fn mentions_product(&self, line: &str) -> bool {
        line.split_whitespace()
            .any(|t| self.products.product_in_token(t).is_some())
    }
}

/// Trade from side/date/quantity/price capture groups
fn build_trade(
    caps: &Captures<'_>,
    asset: &str,
    ticker: &FuturesTicker,
    date_group: usize,
    qty_group: usize,
    price_group: usize,
) -> Option<Trade> {
    let side = Side::parse(&caps[1])?;
    let quantity = parse_brazilian_decimal(&caps[qty_group]).ok()?;
    let price = parse_brazilian_decimal(&caps[price_group]).ok()?;
    if quantity <= Decimal::ZERO {
        return None;
    }

    let mut trade = Trade::new(side, asset, quantity, price)?;
    trade.maturity_date = caps
        .get(date_group)
        .and_then(|m| parse_note_date(m.as_str()));
    Some(trade.with_futures(ticker))
}

pub(super) fn with_tail(mut trade: Trade, line: &str, caps: &Captures<'_>) -> Trade {
    let end = caps.get(0).map(|m| m.end()).unwrap_or(line.len());
    let Some(tail) = TRADE_TAIL.captures(&line[end..]) else {
        return trade;
    };

    trade.kind = tail.get(1).and_then(|m| TradeKind::parse(m.as_str()));
    if let Some(value) = tail.get(2) {
        trade.operation_value = parse_brazilian_decimal(value.as_str()).unwrap_or_default();
    }
    trade.debit_credit = tail.get(3).and_then(|m| DebitCredit::parse(m.as_str()));
    if let Some(fee) = tail.get(4) {
        trade.operational_fee = parse_brazilian_decimal(fee.as_str()).unwrap_or_default();
    }
    trade
}

impl NoteExtractor for FuturesExtractor {
    fn name(&self) -> &'static str {
        "futures"
    }

    fn extract(&self, doc: &NoteDocument) -> Result<Option<BrokerageNote>> {
        let mut note = notes::skeleton(doc, self.name());

        for line in doc.lines() {
            if let Some(trade) = self.parse_line(line) {
                trace!("{}: futures line '{}'", doc.file_name, line);
                note.push_trade(trade);
            }
        }

        for line in doc.lines().filter(|l| self.mentions_product(l)) {
            if let Some(trade) = self.parse_slashed_side(line) {
                note.push_trade(trade);
            }
        }

        if note.trades.is_empty() {
            debug!("{}: no futures contracts found", doc.file_name);
            return Ok(None);
        }
        Ok(Some(note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn extractor() -> FuturesExtractor {
        FuturesExtractor::new(ProductSet::default())
    }

    #[test]
    fn test_split_contract_line() {
        let t = extractor()
            .parse_line("C WDO F25 02/01/2025 1 6.088,0000 DAY TRADE 12,00 D 0,00")
            .unwrap();
        assert_eq!(t.side, Side::Buy);
        assert_eq!(t.asset, "WDO F25");
        assert_eq!(t.ticker, "WDO");
        assert_eq!(t.maturity.as_deref(), Some("F25"));
        assert_eq!(t.maturity_month.as_deref(), Some("Janeiro"));
        assert_eq!(t.maturity_date, NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(t.quantity, dec!(1));
        assert_eq!(t.price, dec!(6088));
        assert_eq!(t.kind, Some(TradeKind::DayTrade));
        assert_eq!(t.operation_value, dec!(12.00));
        assert_eq!(t.debit_credit, Some(DebitCredit::Debit));
    }

    #[test]
    fn test_glued_contract_line() {
        let t = extractor()
            .parse_line("V WINJ25 16/04/2025 3 131.958,0000 DAY TRADE 82,80 C 0,00")
            .unwrap();
        assert_eq!(t.side, Side::Sell);
        assert_eq!(t.asset, "WINJ25");
        assert_eq!(t.ticker, "WIN");
        assert_eq!(t.maturity_month.as_deref(), Some("Abril"));
        assert_eq!(t.maturity_date, NaiveDate::from_ymd_opt(2025, 4, 16));
        assert_eq!(t.price, dec!(131958));
        assert_eq!(t.debit_credit, Some(DebitCredit::Credit));
        assert_eq!(t.total, dec!(395874));
    }

    #[test]
    fn test_glued_without_date_gets_approximate_expiry() {
        let t = extractor().parse_line("C WDOK23 10 5.278,50").unwrap();
        assert_eq!(t.ticker, "WDO");
        assert_eq!(t.maturity_date, NaiveDate::from_ymd_opt(2023, 5, 15));
        assert_eq!(t.kind, None);
    }

    #[test]
    fn test_glued_unknown_product_is_not_futures() {
        assert!(extractor().parse_line("C KLBN11 100 20,00").is_none());
    }

    #[test]
    fn test_generic_scan_with_extra_columns() {
        let t = extractor()
            .parse_line("BMF V WIN Q24 NORMAL 2 128.500,00")
            .unwrap();
        assert_eq!(t.side, Side::Sell);
        assert_eq!(t.ticker, "WIN");
        assert_eq!(t.maturity.as_deref(), Some("Q24"));
        assert_eq!(t.quantity, dec!(2));
        assert_eq!(t.price, dec!(128500.00));
    }

    #[test]
    fn test_generic_needs_a_maturity_next_to_bare_product() {
        let ex = extractor();
        assert!(ex.parse_line("B3 RV LISTADO C X 100 38,50 3.850,00").is_none());
        assert!(ex.parse_line("DI C 10 5,00").is_none());
        let t = ex.parse_line("B3 BMF C WIN V25 1 130.000,00").unwrap();
        assert_eq!(t.asset, "WIN V25");
    }

    #[test]
    fn test_generic_skips_stock_rows_naming_b3() {
        assert!(extractor()
            .parse_line("B3 RV LISTADO C VISTA PETR4 ON N2 100 38,50 3.850,00 D")
            .is_none());
    }

    #[test]
    fn test_slashed_side_row() {
        let t = extractor()
            .parse_slashed_side("C/V DOL H25 5 6.100,00")
            .unwrap();
        assert_eq!(t.side, Side::Buy);
        assert_eq!(t.ticker, "DOL");
        assert_eq!(t.quantity, dec!(5));
    }

    #[test]
    fn test_stock_lines_are_ignored() {
        let ex = extractor();
        assert!(ex
            .parse_line("1-BOVESPA C VISTA PETR4 100 38,50 3.850,00 D")
            .is_none());
        assert!(ex.parse_line("C/V Mercadoria Vencimento Quantidade").is_none());
    }

    #[test]
    fn test_extract_dedupes_and_fills_fees() {
        let doc = NoteDocument::from_text(
            "8401877_20250416.txt",
            "BTG PACTUAL\n\
             C WINJ25 16/04/2025 3 131.820,0000 DAY TRADE 82,80 C 0,00\n\
             C WINJ25 16/04/2025 3 131.820,0000 DAY TRADE 82,80 C 0,00\n\
             Taxa de registro: 3,15\n",
        );
        let note = extractor().extract(&doc).unwrap().unwrap();
        assert_eq!(note.trades.len(), 1);
        assert_eq!(note.broker, "btg");
        assert_eq!(note.fees.get(crate::notes::FeeKind::Registration), dec!(3.15));
    }

    #[test]
    fn test_extract_without_contracts_is_none() {
        let doc = NoteDocument::from_text("n.txt", "C VISTA PETR4 100 38,50 3.850,00");
        assert!(extractor().extract(&doc).unwrap().is_none());
    }
}
