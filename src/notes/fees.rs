//! Note-level fees and totals
//!
//! Each fee kind has a list of label patterns; the first label found in the
//! text gives the value. Values may carry an `R$` prefix and an optional
//! colon between label and amount.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use super::model::{FeeKind, Fees};
use crate::utils::parse_brazilian_decimal;

const VALUE: &str = r"\s*:?\s*(?:R\$)?\s*([\d.,]*\d)";

fn labels(kind: FeeKind) -> &'static [&'static str] {
    match kind {
        FeeKind::Settlement => &[
            r"taxa\s+de\s+liquida[cç][aã]o",
            r"liquida[cç][aã]o",
        ],
        FeeKind::Registration => &[r"taxa\s+de\s+registro", r"registro"],
        FeeKind::TermOptions => &[r"taxa\s+de\s+termo\s*/\s*op[cç][oõ]es", r"termo\s*/\s*op[cç][oõ]es"],
        FeeKind::Ana => &[r"taxa\s+a\.n\.a"],
        FeeKind::Emoluments => &[r"emolumentos"],
        FeeKind::Operational => &[
            r"taxa\s+(?:de\s+)?operacional",
            r"operacional",
            r"taxa\s+(?:de\s+)?opera[cç][aã]o",
        ],
        FeeKind::Execution => &[r"execu[çc][ãa]o"],
        FeeKind::Brokerage => &[r"corretagem"],
        FeeKind::Iss => &[r"\b(?:imposto|i\.?s\.?s\.?)"],
        FeeKind::Irrf => &[r"(?:i\.?r\.?r\.?f\.?|imposto\s+de\s+renda)"],
        FeeKind::Others => &[r"(?:outras\s+)?taxas"],
        FeeKind::NetValue => &[
            r"(?:valor|l[ií]quido)\s+(?:l[ií]quido|para|da\s+nota)(?:\s+\d{2}/\d{2}/\d{4})?",
            r"(?:total|l[ií]quido)\s+(?:l[ií]quido|para\s+liquida[cç][aã]o)(?:\s+\d{2}/\d{2}/\d{4})?",
        ],
        FeeKind::Adjustment => &[r"(?:taxa\s+de\s+)?ajuste"],
        FeeKind::OperationValue => &[
            r"valor\s+(?:de|da)?\s*opera[çc][aã]o",
            r"valor\s+(?:d/c|d[eé]bito/cr[eé]dito)",
        ],
    }
}

static FEE_PATTERNS: Lazy<Vec<(FeeKind, Vec<Regex>)>> = Lazy::new(|| {
    FeeKind::ALL
        .iter()
        .map(|kind| {
            let patterns = labels(*kind)
                .iter()
                .map(|label| {
                    Regex::new(&format!("(?i){}{}", label, VALUE)).expect("valid fee regex")
                })
                .collect();
            (*kind, patterns)
        })
        .collect()
});

/// Value of one fee kind, if any of its labels appears with an amount
pub fn find_fee(text: &str, kind: FeeKind) -> Option<rust_decimal::Decimal> {
    let (_, patterns) = FEE_PATTERNS.iter().find(|(k, _)| *k == kind)?;
    patterns
        .iter()
        .filter_map(|re| re.captures(text))
        .find_map(|caps| parse_brazilian_decimal(&caps[1]).ok())
}

/// Every fee kind found in the text
pub fn extract_fees(text: &str) -> Fees {
    let mut fees = Fees::default();
    for kind in FeeKind::ALL {
        if let Some(value) = find_fee(text, kind) {
            trace!("fee {:?} = {}", kind, value);
            fees.set(kind, value);
        }
    }
    fees
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_settlement_and_emoluments() {
        let text = "Taxa de liquidação 0,95\nEmolumentos 0,21\n";
        let fees = extract_fees(text);
        assert_eq!(fees.get(FeeKind::Settlement), dec!(0.95));
        assert_eq!(fees.get(FeeKind::Emoluments), dec!(0.21));
        assert!(!fees.contains(FeeKind::Brokerage));
    }

    #[test]
    fn test_currency_prefix_and_colon() {
        assert_eq!(
            find_fee("Taxa de registro: R$ 3,15", FeeKind::Registration),
            Some(dec!(3.15))
        );
        assert_eq!(
            find_fee("Corretagem R$1.234,50", FeeKind::Brokerage),
            Some(dec!(1234.50))
        );
    }

    #[test]
    fn test_net_value_with_settlement_date() {
        assert_eq!(
            find_fee("Valor líquido para 05/02/2025 848,84", FeeKind::NetValue),
            Some(dec!(848.84))
        );
        assert_eq!(
            find_fee("Total líquido da nota 25,35", FeeKind::NetValue),
            Some(dec!(25.35))
        );
    }

    #[test]
    fn test_label_without_amount_is_absent() {
        assert_eq!(find_fee("Corretagem", FeeKind::Brokerage), None);
        assert!(extract_fees("nenhuma taxa aqui").is_empty());
    }
}
