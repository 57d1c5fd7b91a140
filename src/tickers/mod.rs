//! B3 futures contract tickers
//!
//! A futures ticker is a product prefix, a month letter and a two digit
//! year: `WINJ25` is the Ibovespa mini contract expiring in April 2025.
//! Notes print it either glued (`WINJ25`) or split (`WIN J25`).

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// Month letter, month number and Portuguese month name
const MONTH_CODES: [(char, u32, &str); 12] = [
    ('F', 1, "Janeiro"),
    ('G', 2, "Fevereiro"),
    ('H', 3, "Março"),
    ('J', 4, "Abril"),
    ('K', 5, "Maio"),
    ('M', 6, "Junho"),
    ('N', 7, "Julho"),
    ('Q', 8, "Agosto"),
    ('U', 9, "Setembro"),
    ('V', 10, "Outubro"),
    ('X', 11, "Novembro"),
    ('Z', 12, "Dezembro"),
];

/// Futures products recognised without configuration
pub const DEFAULT_FUTURES_PRODUCTS: &[&str] = &[
    "WIN", "WDO", "DOL", "IND", "BGI", "CCM", "ICF", "DI1", "DAP", "SJC", "ISP", "EUR", "FRC",
    "BOI", "DDI", "B3", "DI",
];

/// Day of month used when a note does not print the expiry date
const APPROX_EXPIRY_DAY: u32 = 15;

static GLUED_TICKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9]{1,3})([FGHJKMNQUVXZ])(\d{2})$").expect("valid ticker regex")
});

pub fn month_from_code(code: char) -> Option<u32> {
    let code = code.to_ascii_uppercase();
    MONTH_CODES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, month, _)| *month)
}

pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_CODES
        .iter()
        .find(|(_, m, _)| *m == month)
        .map(|(_, _, name)| *name)
}

/// Expiry part of a ticker: month letter plus year (`J25`, sometimes `J5`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Maturity {
    pub month_code: char,
    pub month: u32,
    /// Two-digit year as printed; one digit when the note abbreviates it
    pub year_digits: String,
}

impl Maturity {
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim().to_uppercase();
        let mut chars = code.chars();
        let letter = chars.next()?;
        let digits: String = chars.collect();
        if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let month = month_from_code(letter)?;
        Some(Self {
            month_code: letter,
            month,
            year_digits: digits,
        })
    }

    pub fn code(&self) -> String {
        format!("{}{}", self.month_code, self.year_digits)
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.month).unwrap_or_default()
    }

    /// Full year, only when the note printed two digits
    pub fn year(&self) -> Option<i32> {
        if self.year_digits.len() != 2 {
            return None;
        }
        self.year_digits.parse::<i32>().ok().map(|yy| 2000 + yy)
    }

    /// The 15th of the expiry month
    pub fn approx_expiry(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year()?, self.month, APPROX_EXPIRY_DAY)
    }
}

/// A decomposed futures ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuturesTicker {
    pub product: String,
    pub maturity: Maturity,
}

impl FuturesTicker {
    /// Parse `WINJ25`, `WIN J25` or `DI1F27`.
    ///
    /// Glued codes are split at the month letter that precedes the year,
    /// so unknown products still decompose.
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        let tokens: Vec<&str> = upper.split_whitespace().collect();

        match tokens.as_slice() {
            [product, maturity] => {
                let maturity = Maturity::parse(maturity)?;
                if product.is_empty() || !product.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return None;
                }
                Some(Self {
                    product: product.to_string(),
                    maturity,
                })
            }
            [glued] => {
                let caps = GLUED_TICKER.captures(glued)?;
                let maturity = Maturity::parse(&format!("{}{}", &caps[2], &caps[3]))?;
                Some(Self {
                    product: caps[1].to_string(),
                    maturity,
                })
            }
            _ => None,
        }
    }

    /// Glued form, `WINJ25`
    pub fn code(&self) -> String {
        format!("{}{}", self.product, self.maturity.code())
    }
}

impl fmt::Display for FuturesTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.product, self.maturity.code())
    }
}

/// Known product list, longest prefixes first so `DI1` wins over `DI`
#[derive(Debug, Clone)]
pub struct ProductSet {
    products: Vec<String>,
}

impl Default for ProductSet {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}

impl ProductSet {
    pub fn with_extra(extra: &[String]) -> Self {
        let mut products: Vec<String> = DEFAULT_FUTURES_PRODUCTS
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().map(|p| p.trim().to_uppercase()))
            .filter(|p| !p.is_empty())
            .collect();
        products.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        products.dedup();
        Self { products }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|s| s.as_str())
    }

    /// Split a glued contract code using the known products.
    ///
    /// `WDOK23` becomes `WDO` + `K23`. Returns `None` when no known product
    /// prefixes the code or the remainder is not a maturity.
    pub fn split_contract(&self, code: &str) -> Option<FuturesTicker> {
        let code = code.trim().to_uppercase();
        self.iter().find_map(|product| {
            let rest = code.strip_prefix(product)?;
            let maturity = Maturity::parse(rest)?;
            Some(FuturesTicker {
                product: product.to_string(),
                maturity,
            })
        })
    }

    /// Decompose a code typed by the user. Glued codes need a known
    /// product prefix (`KLBN11` is a stock unit); the split form
    /// (`XYZ K25`) is taken as written.
    pub fn decompose(&self, raw: &str) -> Option<FuturesTicker> {
        let raw = raw.trim();
        if raw.contains(char::is_whitespace) {
            return FuturesTicker::parse(raw);
        }
        self.split_contract(raw)
    }

    /// Known product named by a token: the bare product (`WIN`) or a glued
    /// contract (`WINJ25`)
    pub fn product_in_token(&self, token: &str) -> Option<&str> {
        let token = token.trim().to_uppercase();
        self.iter().find(|product| {
            token == *product
                || token
                    .strip_prefix(product)
                    .is_some_and(|rest| Maturity::parse(rest).is_some())
        })
    }
}
