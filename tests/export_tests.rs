use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use chrono::NaiveDate;
use notas::batch::{BatchRunner, InputSelection};
use notas::extractors::ExtractorCascade;
use notas::notes::FeeKind;
use notas::report::{columns, csv_export, xlsx, ReportOptions, NO_TRADES_LABEL};
use notas::tickers::ProductSet;
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn runner() -> BatchRunner {
    BatchRunner::new(
        ExtractorCascade::with_defaults(&ProductSet::default()),
        ReportOptions::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
    )
    .with_progress(false)
}

fn column_index(name: &str) -> usize {
    columns().iter().position(|c| *c == name).unwrap()
}

fn cell_string(value: Option<&Data>) -> String {
    value.and_then(|d| d.get_string()).unwrap_or_default().to_string()
}

fn cell_float(value: Option<&Data>) -> f64 {
    value.and_then(|d| d.get_float()).unwrap_or_default()
}

#[test]
fn test_fixtures_extract_into_months() {
    let files = vec![
        fixture("btg_futures.txt"),
        fixture("xp_stocks.txt"),
        fixture("fees_only.txt"),
    ];
    let outcome = runner().run(&files).unwrap();

    assert_eq!(outcome.stats.files_processed, 3);
    assert_eq!(outcome.stats.files_failed, 0);
    assert_eq!(outcome.stats.notes, 3);
    assert_eq!(outcome.stats.trades, 4);
    let months: Vec<&str> = outcome.report.month_keys().collect();
    assert_eq!(months, vec!["2025_01", "2025_04"]);

    let btg = outcome.notes.iter().find(|n| n.broker == "btg").unwrap();
    assert_eq!(btg.number.as_deref(), Some("8401877"));
    assert_eq!(btg.extractor, "futures");
    assert_eq!(btg.fees.get(FeeKind::Registration), dec!(3.15));

    let xp = outcome.notes.iter().find(|n| n.broker == "xp").unwrap();
    assert_eq!(xp.client.as_deref(), Some("FULANO DE TAL"));
    assert_eq!(xp.summary().net_value, dec!(846.16));

    let january = outcome.report.rows("2025_01");
    assert_eq!(january.len(), 3);
    assert!(january.iter().any(|r| r.trade_kind == NO_TRADES_LABEL));
    let petr = january.iter().find(|r| r.commodity == "PETR4").unwrap();
    assert_eq!(petr.fee(FeeKind::Settlement), dec!(0.48));
    assert_eq!(petr.fee(FeeKind::Emoluments), dec!(0.10));
}

#[test]
fn test_workbook_has_one_sheet_per_month() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("notas.xlsx");
    let outcome = runner()
        .run(&[fixture("btg_futures.txt"), fixture("xp_stocks.txt")])
        .unwrap();
    xlsx::write_workbook(&outcome.report, &output).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&output).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["2025_01", "2025_04"]);

    let range = workbook.worksheet_range("2025_04").unwrap();
    assert_eq!(range.height(), 3);
    assert_eq!(range.width(), columns().len());
    assert_eq!(cell_string(range.get_value((0, 0))), "Data");
    assert_eq!(
        cell_string(range.get_value((0, 24))),
        "Ativo Original"
    );

    let commodity = column_index("Mercadoria") as u32;
    let number = column_index("Número da Nota") as u32;
    let price = column_index("Preço / Ajuste") as u32;
    let registration = column_index("Taxa de Registro") as u32;

    assert_eq!(cell_string(range.get_value((1, commodity))), "WIN");
    assert_eq!(cell_string(range.get_value((1, number))), "8401877");
    assert_eq!(cell_float(range.get_value((1, price))), 131820.0);
    assert_eq!(cell_float(range.get_value((2, price))), 131958.0);
    assert!((cell_float(range.get_value((1, registration))) - 1.575).abs() < 1e-9);
}

#[test]
fn test_csv_export_has_month_column() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("notas.csv");
    let outcome = runner().run(&[fixture("xp_stocks.txt")]).unwrap();
    csv_export::write_csv(&outcome.report, &output).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let mut lines = content.lines();
    assert!(lines.next().unwrap().starts_with("Mês;Data;Número da Nota"));
    let first = lines.next().unwrap();
    assert!(first.starts_with("2025_01;03/01/2025;12345;C;PETR4"));
    assert!(first.contains(";38,50;"));
    assert_eq!(lines.count(), 1);
}

#[test]
fn test_folder_selection_ignores_non_pdf_files() {
    let dir = TempDir::new().unwrap();
    std::fs::copy(fixture("xp_stocks.txt"), dir.path().join("xp_stocks.txt")).unwrap();

    let selection = InputSelection::Folder(dir.path().to_path_buf());
    assert!(selection.resolve().is_err());
}
