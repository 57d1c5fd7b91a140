// CSV output - every month in one file, `;` separated, Brazilian decimals

use anyhow::{Context, Result};
use csv::WriterBuilder;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::info;

use super::{columns, Cell, MonthlyReport};
use crate::error::NoteError;

fn render(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) => text.clone(),
        Cell::Date(date) => date.format("%d/%m/%Y").to_string(),
        Cell::Money(value) => format!("{:.2}", value).replace('.', ","),
        Cell::Quantity(value) => decimal_br(value.normalize()),
    }
}

/// Plain number with a decimal comma, no thousands separator
fn decimal_br(value: Decimal) -> String {
    value.to_string().replace('.', ",")
}

/// Write the report as CSV with a leading `Mês` column
pub fn write_csv(report: &MonthlyReport, path: &Path) -> Result<()> {
    if report.is_empty() {
        return Err(NoteError::Report("nothing to export".to_string()).into());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut header = vec!["Mês"];
    header.extend(columns());
    writer.write_record(&header)?;

    for (month, rows) in report.iter() {
        for row in rows {
            let mut record = vec![month.to_string()];
            record.extend(row.cells().iter().map(render));
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", report.row_count(), path.display());
    Ok(())
}
