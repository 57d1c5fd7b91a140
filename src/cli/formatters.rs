//! Output formatting module for CLI display
//!
//! Handlers compute; these functions only turn results into terminal text.

use colored::Colorize;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::batch::{BatchStats, FileFailure};
use crate::notes::BrokerageNote;
use crate::tickers::FuturesTicker;
use crate::utils::{format_currency, format_decimal_br};

/// Pretty JSON, or an error object when serialization fails
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "JSON serialization failed: {}"}}"#, e))
}

/// Format an extracted note for terminal output
pub fn format_note(note: &BrokerageNote) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} {}\n\n",
        "📄".cyan().bold(),
        note.file_name.bold()
    ));
    let date = note
        .date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "N/A".to_string());
    output.push_str(&format!("  {:<12} {}\n", "Broker:", note.broker));
    output.push_str(&format!(
        "  {:<12} {}\n",
        "Note:",
        note.number.as_deref().unwrap_or("N/A")
    ));
    output.push_str(&format!("  {:<12} {}\n", "Date:", date));
    if let Some(client) = &note.client {
        output.push_str(&format!("  {:<12} {}\n", "Client:", client));
    }
    output.push_str(&format!("  {:<12} {}\n\n", "Extractor:", note.extractor));

    #[derive(Tabled)]
    struct TradeRow {
        #[tabled(rename = "C/V")]
        side: String,
        #[tabled(rename = "Asset")]
        asset: String,
        #[tabled(rename = "Maturity")]
        maturity: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Total")]
        total: String,
        #[tabled(rename = "Kind")]
        kind: String,
    }

    let rows: Vec<TradeRow> = note
        .real_trades()
        .map(|t| TradeRow {
            side: match t.side.as_code() {
                "C" => "C".green().to_string(),
                code => code.red().to_string(),
            },
            asset: t.asset.clone(),
            maturity: t
                .maturity_date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .or_else(|| t.maturity.clone())
                .unwrap_or_default(),
            quantity: t.quantity.normalize().to_string(),
            price: format_decimal_br(t.price),
            total: format_currency(t.total),
            kind: t.kind.map(|k| k.as_str().to_string()).unwrap_or_default(),
        })
        .collect();

    if rows.is_empty() {
        output.push_str(&format!("{} No trades on this note\n", "ℹ".blue().bold()));
    } else {
        let mut table = Table::new(&rows);
        table.with(Style::rounded());
        table.modify(Columns::new(3..6), Alignment::right());
        output.push_str(&table.to_string());
        output.push('\n');
    }

    if !note.fees.is_empty() {
        #[derive(Tabled)]
        struct FeeRow {
            #[tabled(rename = "Fee")]
            label: String,
            #[tabled(rename = "Value")]
            value: String,
        }

        let fees: Vec<FeeRow> = note
            .fees
            .iter()
            .map(|(kind, value)| FeeRow {
                label: kind.label().to_string(),
                value: format_currency(value),
            })
            .collect();
        let mut table = Table::new(&fees);
        table.with(Style::rounded());
        table.modify(Columns::new(1..), Alignment::right());
        output.push('\n');
        output.push_str(&table.to_string());
        output.push('\n');
    }

    let summary = note.summary();
    output.push_str(&format!("\n{}", "━".repeat(40).bright_black()));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Buys:".bold(),
        format_currency(summary.total_buys)
    ));
    output.push_str(&format!(
        "\n{:<16} {}",
        "Sells:".bold(),
        format_currency(summary.total_sells)
    ));
    let net = format_currency(summary.net_value);
    let net = if summary.net_value >= Decimal::ZERO {
        net.green()
    } else {
        net.red()
    };
    output.push_str(&format!("\n{:<16} {}\n", "Net:".bold(), net));

    output
}

/// Format the result of an export run
pub fn format_batch(stats: &BatchStats, failures: &[FileFailure], output: Option<&Path>) -> String {
    let mut out = String::new();

    match output {
        Some(path) => out.push_str(&format!(
            "\n{} Export complete: {}\n",
            "✓".green().bold(),
            path.display().to_string().green()
        )),
        None => out.push_str(&format!(
            "\n{} Dry run - nothing written\n",
            "ℹ".blue().bold()
        )),
    }

    out.push_str(&format!("  Files processed: {}\n", stats.files_processed));
    if stats.files_skipped > 0 {
        out.push_str(&format!(
            "  Skipped (duplicates): {}\n",
            stats.files_skipped.to_string().yellow()
        ));
    }
    if stats.files_failed > 0 {
        out.push_str(&format!(
            "  Failed: {}\n",
            stats.files_failed.to_string().red()
        ));
    }
    out.push_str(&format!("  Notes: {}\n", stats.notes));
    out.push_str(&format!("  Trades: {}\n", stats.trades));
    out.push_str(&format!("  Months: {}\n", stats.months));

    for failure in failures {
        let name = failure
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push_str(&format!(
            "  {} {}: {}\n",
            "⚠".yellow(),
            name,
            failure.error
        ));
    }

    out
}

/// Format a decomposed futures ticker
pub fn format_ticker(ticker: &FuturesTicker) -> String {
    let expiry = ticker
        .maturity
        .approx_expiry()
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "{} {}\n  {:<10} {}\n  {:<10} {} ({})\n  {:<10} {}\n",
        "✓".green().bold(),
        ticker.code().bold(),
        "Product:",
        ticker.product,
        "Maturity:",
        ticker.maturity.code(),
        ticker.maturity.month_name(),
        "Expiry:",
        expiry
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::{Side, Trade};
    use rust_decimal_macros::dec;

    #[test]
    fn test_ticker_output() {
        colored::control::set_override(false);
        let ticker = FuturesTicker::parse("WINJ25").unwrap();
        let out = format_ticker(&ticker);
        assert!(out.contains("WINJ25"));
        assert!(out.contains("Abril"));
        assert!(out.contains("15/04/2025"));
    }

    #[test]
    fn test_note_output_lists_trades() {
        colored::control::set_override(false);
        let mut note = BrokerageNote::new("n.pdf", "direct");
        note.push_trade(Trade::new(Side::Buy, "PETR4", dec!(100), dec!(38.50)).unwrap());
        let out = format_note(&note);
        assert!(out.contains("PETR4"));
        assert!(out.contains("R$ 3.850,00"));
    }

    #[test]
    fn test_batch_output() {
        colored::control::set_override(false);
        let stats = BatchStats {
            files_processed: 2,
            files_failed: 1,
            notes: 2,
            trades: 5,
            months: 1,
            ..BatchStats::default()
        };
        let failures = vec![FileFailure {
            path: "/tmp/ruim.pdf".into(),
            error: "pdf error: bad xref".to_string(),
        }];
        let out = format_batch(&stats, &failures, None);
        assert!(out.contains("Dry run"));
        assert!(out.contains("Trades: 5"));
        assert!(out.contains("ruim.pdf: pdf error"));
    }
}
