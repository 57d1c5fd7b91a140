// Report module - note rows grouped by trading month, written as xlsx or CSV

pub mod csv_export;
pub mod xlsx;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::Config;
use crate::notes::{BrokerageNote, FeeKind, Trade, PLACEHOLDER_ASSET};

/// `Tipo Negócio` of the row emitted for a note without trades
pub const NO_TRADES_LABEL: &str = "SEM TRANSAÇÕES";
const MISSING: &str = "N/A";
/// Digits a price must have before it is considered unscaled
const UNSCALED_MIN_DIGITS: usize = 5;

/// Columns before the fee columns
const LEADING_COLUMNS: [&str; 11] = [
    "Data",
    "Número da Nota",
    "C/V",
    "Mercadoria",
    "Vencimento",
    "Quantidade",
    "Preço / Ajuste",
    "Tipo Negócio",
    "Valor Operação / D/C",
    "D/C",
    "Taxa Operacional",
];
const TRAILING_COLUMNS: [&str; 3] = ["Taxa de Custódia", "Impostos", "Ativo Original"];

/// Fee kinds that get their own column, in column order
pub fn fee_columns() -> impl Iterator<Item = FeeKind> {
    FeeKind::ALL.into_iter().filter(|k| k.is_cost())
}

/// Header row shared by the xlsx and CSV writers
pub fn columns() -> Vec<&'static str> {
    LEADING_COLUMNS
        .iter()
        .copied()
        .chain(fee_columns().map(|k| k.label()))
        .chain(TRAILING_COLUMNS.iter().copied())
        .collect()
}

/// How notes become rows
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Divide prices above `unscaled_price_threshold` by 100
    pub fix_unscaled_prices: bool,
    pub unscaled_price_threshold: Decimal,
    /// Date used for notes that print none
    pub fallback_date: NaiveDate,
}

impl ReportOptions {
    pub fn new(fallback_date: NaiveDate) -> Self {
        Self {
            fix_unscaled_prices: false,
            unscaled_price_threshold: Decimal::from(10_000),
            fallback_date,
        }
    }

    pub fn from_config(config: &Config, fallback_date: NaiveDate) -> Self {
        Self {
            fix_unscaled_prices: config.fix_unscaled_prices,
            unscaled_price_threshold: config.unscaled_price_threshold,
            fallback_date,
        }
    }

    /// Undo a missing decimal separator: `13182000` becomes `131820.00`
    pub fn corrected_price(&self, price: Decimal) -> Decimal {
        if !self.fix_unscaled_prices || price <= self.unscaled_price_threshold {
            return price;
        }
        let integer_digits = price.trunc().abs().to_string().len();
        if integer_digits >= UNSCALED_MIN_DIGITS {
            price / Decimal::ONE_HUNDRED
        } else {
            price
        }
    }
}

/// A typed cell, rendered differently by each writer
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Date(NaiveDate),
    Money(Decimal),
    Quantity(Decimal),
}

/// One spreadsheet row: a trade, or a note without trades
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub note_number: String,
    pub side: String,
    pub commodity: String,
    pub maturity_date: Option<NaiveDate>,
    pub maturity_code: Option<String>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub trade_kind: String,
    pub operation_value: Decimal,
    pub debit_credit: String,
    pub operational_fee: Decimal,
    /// This row's share of each note fee, in `fee_columns()` order
    pub fees: Vec<(FeeKind, Decimal)>,
    pub custody_fee: Decimal,
    pub taxes: Decimal,
    pub original_asset: String,
}

impl ReportRow {
    fn from_trade(
        note: &BrokerageNote,
        trade: &Trade,
        date: NaiveDate,
        divisor: Decimal,
        options: &ReportOptions,
    ) -> Self {
        Self {
            date,
            note_number: note_number(note),
            side: trade.side.as_code().to_string(),
            commodity: trade.ticker.clone(),
            maturity_date: trade.maturity_date,
            maturity_code: trade.maturity.clone(),
            quantity: trade.quantity,
            price: options.corrected_price(trade.price),
            trade_kind: trade
                .kind
                .map(|k| k.as_str().to_string())
                .unwrap_or_default(),
            operation_value: trade.operation_value,
            debit_credit: trade
                .debit_credit
                .map(|dc| dc.as_code().to_string())
                .unwrap_or_default(),
            operational_fee: trade.operational_fee,
            fees: fee_shares(note, divisor),
            custody_fee: Decimal::ZERO,
            taxes: Decimal::ZERO,
            original_asset: trade.asset.clone(),
        }
    }

    fn without_trades(note: &BrokerageNote, date: NaiveDate) -> Self {
        Self {
            date,
            note_number: note_number(note),
            side: String::new(),
            commodity: MISSING.to_string(),
            maturity_date: None,
            maturity_code: None,
            quantity: Decimal::ZERO,
            price: Decimal::ZERO,
            trade_kind: NO_TRADES_LABEL.to_string(),
            operation_value: Decimal::ZERO,
            debit_credit: String::new(),
            operational_fee: Decimal::ZERO,
            fees: fee_shares(note, Decimal::ONE),
            custody_fee: Decimal::ZERO,
            taxes: Decimal::ZERO,
            original_asset: PLACEHOLDER_ASSET.to_string(),
        }
    }

    /// Share of one fee column
    pub fn fee(&self, kind: FeeKind) -> Decimal {
        self.fees
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| *v)
            .unwrap_or_default()
    }

    /// Cells in `columns()` order
    pub fn cells(&self) -> Vec<Cell> {
        let maturity = match (self.maturity_date, &self.maturity_code) {
            (Some(date), _) => Cell::Date(date),
            (None, Some(code)) => Cell::Text(code.clone()),
            (None, None) => Cell::Text(String::new()),
        };

        let mut cells = vec![
            Cell::Date(self.date),
            Cell::Text(self.note_number.clone()),
            Cell::Text(self.side.clone()),
            Cell::Text(self.commodity.clone()),
            maturity,
            Cell::Quantity(self.quantity),
            Cell::Money(self.price),
            Cell::Text(self.trade_kind.clone()),
            Cell::Money(self.operation_value),
            Cell::Text(self.debit_credit.clone()),
            Cell::Money(self.operational_fee),
        ];
        cells.extend(self.fees.iter().map(|(_, v)| Cell::Money(*v)));
        cells.push(Cell::Money(self.custody_fee));
        cells.push(Cell::Money(self.taxes));
        cells.push(Cell::Text(self.original_asset.clone()));
        cells
    }
}

fn note_number(note: &BrokerageNote) -> String {
    note.number.clone().unwrap_or_else(|| MISSING.to_string())
}

fn fee_shares(note: &BrokerageNote, divisor: Decimal) -> Vec<(FeeKind, Decimal)> {
    fee_columns()
        .map(|kind| (kind, (note.fees.get(kind) / divisor).round_dp(4)))
        .collect()
}

/// Sheet name for a trading date
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}_{:02}", date.year(), date.month())
}

/// Rows grouped by `YYYY_MM`, months ascending
#[derive(Debug, Clone, Default, Serialize)]
pub struct MonthlyReport {
    months: BTreeMap<String, Vec<ReportRow>>,
    notes: usize,
}

impl MonthlyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every row of one note; returns the number of rows added
    pub fn add_note(&mut self, note: &BrokerageNote, options: &ReportOptions) -> usize {
        let date = note.date.unwrap_or(options.fallback_date);
        let trades: Vec<&Trade> = note.real_trades().collect();

        let rows: Vec<ReportRow> = if trades.is_empty() {
            vec![ReportRow::without_trades(note, date)]
        } else {
            let divisor = Decimal::from(trades.len());
            trades
                .iter()
                .map(|t| ReportRow::from_trade(note, t, date, divisor, options))
                .collect()
        };

        let added = rows.len();
        let key = month_key(date);
        debug!("{}: {} rows into {}", note.file_name, added, key);
        self.months.entry(key).or_default().extend(rows);
        self.notes += 1;
        added
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn note_count(&self) -> usize {
        self.notes
    }

    pub fn row_count(&self) -> usize {
        self.months.values().map(Vec::len).sum()
    }

    pub fn month_keys(&self) -> impl Iterator<Item = &str> {
        self.months.keys().map(String::as_str)
    }

    pub fn rows(&self, month: &str) -> &[ReportRow] {
        self.months.get(month).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ReportRow])> {
        self.months
            .iter()
            .map(|(k, rows)| (k.as_str(), rows.as_slice()))
    }
}
