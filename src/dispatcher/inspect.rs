use anyhow::Result;
use std::path::Path;

use crate::cli::formatters::{format_note, to_json};
use crate::config::Config;
use crate::document::NoteDocument;
use crate::extractors::ExtractorCascade;
use crate::tickers::ProductSet;

pub fn dispatch_inspect(
    file: &Path,
    extractor: Option<&str>,
    config: &Config,
    json_output: bool,
) -> Result<()> {
    let doc = NoteDocument::load(file)?;
    let products = ProductSet::with_extra(&config.futures_products());

    let cascade = match extractor {
        Some(name) => ExtractorCascade::from_names(&[name], &products)?,
        None => ExtractorCascade::from_names(config.extractors.as_slice(), &products)?,
    };
    let note = cascade.run(&doc)?;

    if json_output {
        let payload = serde_json::json!({
            "note": note,
            "summary": note.summary(),
            "content_hash": doc.content_hash,
        });
        println!("{}", to_json(&payload));
    } else {
        print!("{}", format_note(&note));
    }
    Ok(())
}
