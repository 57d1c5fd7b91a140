//! Notas - Brazilian brokerage note (nota de corretagem) exporter
//!
//! This library reads the text layer of brokerage-note PDFs, extracts trades
//! and fees with a cascade of layout-specific extractors, and writes the
//! result as a workbook with one sheet per trading month.

pub mod batch;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod extractors;
pub mod notes;
pub mod report;
pub mod tickers;
pub mod utils;
