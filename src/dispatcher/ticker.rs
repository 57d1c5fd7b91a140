use anyhow::Result;

use crate::cli::formatters::{format_ticker, to_json};
use crate::config::Config;
use crate::error::NoteError;
use crate::tickers::ProductSet;

pub fn dispatch_ticker(code: &str, config: &Config, json_output: bool) -> Result<()> {
    let products = ProductSet::with_extra(&config.futures_products());
    let ticker = products
        .decompose(code)
        .ok_or_else(|| NoteError::InvalidInput(format!("not a futures ticker: {}", code)))?;

    if json_output {
        let payload = serde_json::json!({
            "code": ticker.code(),
            "product": ticker.product,
            "maturity": ticker.maturity.code(),
            "month": ticker.maturity.month,
            "month_name": ticker.maturity.month_name(),
            "year": ticker.maturity.year(),
            "approx_expiry": ticker.maturity.approx_expiry(),
        });
        println!("{}", to_json(&payload));
    } else {
        print!("{}", format_ticker(&ticker));
    }
    Ok(())
}
