//! Excel output: one worksheet per month

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet};
use std::path::Path;
use tracing::info;

use super::{columns, Cell, MonthlyReport, ReportRow};
use crate::error::NoteError;

const MONEY_FORMAT: &str = "R$ #,##0.00";
const DATE_FORMAT: &str = "dd/mm/yyyy";
const QUANTITY_FORMAT: &str = "#,##0";

struct Formats {
    header: Format,
    money: Format,
    date: Format,
    quantity: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            money: Format::new().set_num_format(MONEY_FORMAT),
            date: Format::new().set_num_format(DATE_FORMAT),
            quantity: Format::new().set_num_format(QUANTITY_FORMAT),
        }
    }
}

/// Write the report to `path`, one sheet named `YYYY_MM` per month
pub fn write_workbook(report: &MonthlyReport, path: &Path) -> Result<()> {
    if report.is_empty() {
        return Err(NoteError::Report("nothing to export".to_string()).into());
    }

    let formats = Formats::new();
    let mut workbook = Workbook::new();

    for (month, rows) in report.iter() {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(month)
            .with_context(|| format!("Invalid sheet name {}", month))?;
        write_sheet(worksheet, rows, &formats)
            .with_context(|| format!("Failed to write sheet {}", month))?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {}", path.display()))?;
    info!(
        "Wrote {} rows in {} sheets to {}",
        report.row_count(),
        report.month_keys().count(),
        path.display()
    );
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, rows: &[ReportRow], formats: &Formats) -> Result<()> {
    let headers = columns();
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &formats.header)?;
        let width = (header.chars().count() as f64 + 2.0).max(12.0);
        worksheet.set_column_width(col as u16, width)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, cell) in row.cells().into_iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(r, c, text)?;
                }
                Cell::Date(date) => {
                    worksheet.write_datetime_with_format(r, c, &excel_date(date)?, &formats.date)?;
                }
                Cell::Money(value) => {
                    worksheet.write_number_with_format(r, c, to_f64(value), &formats.money)?;
                }
                Cell::Quantity(value) => {
                    worksheet.write_number_with_format(r, c, to_f64(value), &formats.quantity)?;
                }
            }
        }
    }
    Ok(())
}

fn excel_date(date: NaiveDate) -> Result<ExcelDateTime> {
    let year = u16::try_from(date.year())
        .map_err(|_| NoteError::Report(format!("date out of range: {}", date)))?;
    Ok(ExcelDateTime::from_ymd(
        year,
        date.month() as u8,
        date.day() as u8,
    )?)
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
