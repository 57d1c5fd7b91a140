use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use crate::batch::{BatchRunner, InputSelection};
use crate::cli::formatters::{format_batch, to_json};
use crate::config::Config;
use crate::extractors::ExtractorCascade;
use crate::report::{csv_export, xlsx, ReportOptions};
use crate::tickers::ProductSet;

pub struct ExportRequest {
    pub selection: InputSelection,
    pub output: Option<PathBuf>,
    pub csv: bool,
    pub dry_run: bool,
    pub fix_unscaled_prices: bool,
}

pub fn dispatch_export(request: ExportRequest, config: &Config, json_output: bool) -> Result<()> {
    let files = request.selection.resolve()?;
    info!("Exporting {} note file(s)", files.len());

    let products = ProductSet::with_extra(&config.futures_products());
    let cascade = ExtractorCascade::from_names(config.extractors.as_slice(), &products)?;

    let mut options = ReportOptions::from_config(config, Local::now().date_naive());
    if request.fix_unscaled_prices {
        options.fix_unscaled_prices = true;
    }

    let runner = BatchRunner::new(cascade, options).with_progress(!json_output);
    let outcome = runner.run(&files)?;

    let extension = if request.csv { "csv" } else { "xlsx" };
    let output = request.output.unwrap_or_else(|| {
        request
            .selection
            .default_output(config.output_dir.as_deref(), extension)
    });

    let written = if request.dry_run {
        None
    } else {
        if request.csv {
            csv_export::write_csv(&outcome.report, &output)?;
        } else {
            xlsx::write_workbook(&outcome.report, &output)?;
        }
        Some(output.as_path())
    };

    if json_output {
        let payload = serde_json::json!({
            "output": written,
            "dry_run": request.dry_run,
            "months": outcome.report.month_keys().collect::<Vec<_>>(),
            "stats": outcome.stats,
            "failures": outcome.failures,
        });
        println!("{}", to_json(&payload));
    } else {
        print!("{}", format_batch(&outcome.stats, &outcome.failures, written));
    }

    Ok(())
}
