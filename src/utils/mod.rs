//! Brazilian money helpers
//!
//! Brokerage notes print amounts in the Brazilian locale (`1.234,56`), but
//! some broker layouts (notably BM&F futures exports) use a plain dot
//! decimal (`115180.0`). Everything here works on `Decimal`, never `f64`.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "R$ " prefix (Brazilian Real)
    BRL,
    /// No currency symbol (for table cells)
    None,
}

/// Parse a decimal written in either Brazilian (1.234,56) or international
/// (1,234.56) notation.
///
/// Characters other than digits, `.`, `,` and `-` are dropped first, so
/// `"R$ 82,80 C"` parses as `82.80`. The separator appearing last is taken
/// as the decimal mark.
pub fn parse_brazilian_decimal(raw: &str) -> Result<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    let s = cleaned.trim_matches(|c| c == '.' || c == ',');

    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(comma_pos), Some(dot_pos)) => {
            if comma_pos > dot_pos {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
        (Some(_), None) => {
            // "1234,56" or "1,234,567": a single comma is a decimal mark
            if s.matches(',').count() > 1 {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        (None, Some(_)) => {
            if s.matches('.').count() > 1 {
                s.replace('.', "")
            } else {
                s.to_string()
            }
        }
        (None, None) => s.to_string(),
    };

    Decimal::from_str(&normalized).context(format!("Failed to parse decimal: {}", raw))
}

/// Lenient variant of [`parse_brazilian_decimal`]: blank or garbled cells
/// count as zero.
pub fn parse_amount(raw: &str) -> Decimal {
    parse_brazilian_decimal(raw).unwrap_or(Decimal::ZERO)
}

/// Share quantity as printed on a note. Quantities are whole numbers, so a
/// dot is always a thousands separator: `1.000` is one thousand.
pub fn parse_quantity(raw: &str) -> Result<Decimal> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    Decimal::from_str(&digits).context(format!("Failed to parse quantity: {}", raw))
}

/// Formats a Decimal value using Brazilian locale conventions:
/// thousands separator `.` and decimal separator `,`, right-aligned to
/// `width` when it is non-zero.
///
/// # Examples
/// ```
/// use notas::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234.56), 0, CurrencySymbol::BRL),
///     "R$ 1.234,56"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let mut with_separators = String::with_capacity(integer_part.len() + integer_part.len() / 3);
    for (i, c) in integer_part.chars().enumerate() {
        if i > 0 && (integer_part.len() - i) % 3 == 0 {
            with_separators.push('.');
        }
        with_separators.push(c);
    }

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::BRL => "R$ ",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{}{},{}", prefix, sign, with_separators, decimal_part);

    if width > 0 && result.chars().count() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

/// Format as Brazilian Real with symbol: "R$ 1.234,56"
///
/// ```
/// use notas::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(-500)), "R$ -500,00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::BRL)
}

/// Format number only (no symbol): "1.234,56"
pub fn format_decimal_br(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_brazilian_decimal() {
        assert_eq!(parse_brazilian_decimal("1.234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_brazilian_decimal("20,245.73").unwrap(), dec!(20245.73));
        assert_eq!(parse_brazilian_decimal("100").unwrap(), dec!(100));
        assert_eq!(parse_brazilian_decimal("1234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_brazilian_decimal("115180.0").unwrap(), dec!(115180.0));
    }

    #[test]
    fn test_parse_strips_symbols_and_flags() {
        assert_eq!(parse_brazilian_decimal("R$ 82,80").unwrap(), dec!(82.80));
        assert_eq!(parse_brazilian_decimal("3.850,00 D").unwrap(), dec!(3850.00));
        assert_eq!(parse_brazilian_decimal("10,00.").unwrap(), dec!(10.00));
    }

    #[test]
    fn test_parse_futures_prices_keep_scale() {
        assert_eq!(
            parse_brazilian_decimal("131.820,0000").unwrap(),
            dec!(131820.0000)
        );
        assert_eq!(parse_brazilian_decimal("6.088,0000").unwrap(), dec!(6088));
    }

    #[test]
    fn test_parse_repeated_thousand_separators() {
        assert_eq!(parse_brazilian_decimal("1.234.567").unwrap(), dec!(1234567));
        assert_eq!(parse_brazilian_decimal("1,234,567").unwrap(), dec!(1234567));
    }

    #[test]
    fn test_parse_amount_is_lenient() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("N/A"), Decimal::ZERO);
        assert_eq!(parse_amount("0,95"), dec!(0.95));
    }

    #[test]
    fn test_parse_quantity_dot_is_thousands() {
        assert_eq!(parse_quantity("1.000").unwrap(), dec!(1000));
        assert_eq!(parse_quantity("25").unwrap(), dec!(25));
        assert!(parse_quantity("").is_err());
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(dec!(1234.56)), "R$ 1.234,56");
        assert_eq!(format_currency(dec!(0.99)), "R$ 0,99");
        assert_eq!(format_currency(dec!(1000000)), "R$ 1.000.000,00");
        assert_eq!(format_currency(dec!(123)), "R$ 123,00");
        assert_eq!(format_currency(dec!(-1234.56)), "R$ -1.234,56");
    }

    #[test]
    fn test_format_decimal_br_and_width() {
        assert_eq!(format_decimal_br(dec!(131820)), "131.820,00");
        assert_eq!(
            format_currency_with_width(dec!(100), 15, CurrencySymbol::BRL),
            "      R$ 100,00"
        );
    }
}
