// Extractors - turn the text layer of a note into a BrokerageNote
//
// Broker layouts differ too much for one parser. Each extractor knows a
// family of layouts; the cascade tries them in order and keeps the first
// note with real trades.

pub mod basic;
pub mod direct;
pub mod futures;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::document::NoteDocument;
use crate::error::NoteError;
use crate::notes::BrokerageNote;
use crate::tickers::ProductSet;

pub use basic::BasicExtractor;
pub use direct::DirectExtractor;
pub use futures::FuturesExtractor;

/// Extractor names in the order they are tried by default
pub const DEFAULT_ORDER: &[&str] = &["futures", "direct", "basic"];

pub trait NoteExtractor {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the layout was not recognised
    fn extract(&self, doc: &NoteDocument) -> Result<Option<BrokerageNote>>;
}

/// Build an extractor by name
pub fn build_extractor(name: &str, products: &ProductSet) -> Result<Box<dyn NoteExtractor>> {
    match name.trim().to_lowercase().as_str() {
        "futures" => Ok(Box::new(FuturesExtractor::new(products.clone()))),
        "direct" => Ok(Box::new(DirectExtractor::new(products.clone()))),
        "basic" => Ok(Box::new(BasicExtractor)),
        other => Err(NoteError::Config(format!(
            "unknown extractor '{}' (available: {})",
            other,
            DEFAULT_ORDER.join(", ")
        ))
        .into()),
    }
}

pub struct ExtractorCascade {
    extractors: Vec<Box<dyn NoteExtractor>>,
}

impl ExtractorCascade {
    pub fn with_defaults(products: &ProductSet) -> Self {
        Self {
            extractors: vec![
                Box::new(FuturesExtractor::new(products.clone())),
                Box::new(DirectExtractor::new(products.clone())),
                Box::new(BasicExtractor),
            ],
        }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S], products: &ProductSet) -> Result<Self> {
        let extractors = names
            .iter()
            .map(|name| build_extractor(name.as_ref(), products))
            .collect::<Result<Vec<_>>>()?;
        if extractors.is_empty() {
            return Err(NoteError::Config("extractor list cannot be empty".to_string()).into());
        }
        Ok(Self { extractors })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Run the extractors in order.
    ///
    /// The first note with real trades wins. When none has trades, the first
    /// note that recognised anything (fees, number, broker) is returned so
    /// fee-only notes still reach the report. An extractor that fails is
    /// logged and skipped.
    pub fn run(&self, doc: &NoteDocument) -> Result<BrokerageNote> {
        let mut fallback: Option<BrokerageNote> = None;

        for extractor in &self.extractors {
            match extractor.extract(doc) {
                Ok(Some(note)) if note.has_trades() => {
                    info!(
                        "{}: {} trades via {} extractor",
                        doc.file_name,
                        note.real_trades().count(),
                        extractor.name()
                    );
                    return Ok(note);
                }
                Ok(Some(note)) => {
                    debug!("{}: {} found no trades", doc.file_name, extractor.name());
                    if fallback.is_none() && note.has_content() {
                        fallback = Some(note);
                    }
                }
                Ok(None) => debug!("{}: {} did not match", doc.file_name, extractor.name()),
                Err(e) => warn!("{}: {} extractor failed: {:#}", doc.file_name, extractor.name(), e),
            }
        }

        fallback.ok_or_else(|| NoteError::NoTrades(doc.file_name.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    impl NoteExtractor for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn extract(&self, _doc: &NoteDocument) -> Result<Option<BrokerageNote>> {
            Err(NoteError::InvalidInput("broken layout".to_string()).into())
        }
    }

    #[test]
    fn test_default_order() {
        let cascade = ExtractorCascade::with_defaults(&ProductSet::default());
        assert_eq!(cascade.names(), DEFAULT_ORDER.to_vec());
    }

    #[test]
    fn test_from_names_rejects_unknown() {
        let products = ProductSet::default();
        let cascade = ExtractorCascade::from_names(&["basic", "Direct"], &products).unwrap();
        assert_eq!(cascade.names(), vec!["basic", "direct"]);

        let err = ExtractorCascade::from_names(&["ocr"], &products)
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown extractor 'ocr'"));
        assert!(ExtractorCascade::from_names::<&str>(&[], &products).is_err());
    }

    #[test]
    fn test_failing_extractor_is_skipped() {
        let cascade = ExtractorCascade {
            extractors: vec![Box::new(Failing), Box::new(BasicExtractor)],
        };
        let doc = NoteDocument::from_text("n.txt", "C VISTA PETR4 100 38,50 3.850,00");
        let note = cascade.run(&doc).unwrap();
        assert_eq!(note.extractor, "basic");
        assert_eq!(note.trades.len(), 1);
    }

    #[test]
    fn test_futures_note_uses_futures_extractor() {
        let doc = NoteDocument::from_text(
            "n.txt",
            "BTG PACTUAL\nC WINJ25 16/04/2025 3 131.820,0000 DAY TRADE 82,80 C 0,00",
        );
        let note = ExtractorCascade::with_defaults(&ProductSet::default())
            .run(&doc)
            .unwrap();
        assert_eq!(note.extractor, "futures");
        assert_eq!(note.trades[0].ticker, "WIN");
    }

    #[test]
    fn test_stock_note_falls_through_to_direct() {
        let doc = NoteDocument::from_text(
            "n.txt",
            "XP INVESTIMENTOS\n1-BOVESPA C VISTA PETR4 100 38,50 3.850,00 D",
        );
        let note = ExtractorCascade::with_defaults(&ProductSet::default())
            .run(&doc)
            .unwrap();
        assert_eq!(note.extractor, "direct");
        assert_eq!(note.trades[0].asset, "PETR4");
    }

    #[test]
    fn test_exchange_name_in_stock_row_is_not_a_contract() {
        let doc = NoteDocument::from_text(
            "n.txt",
            "XP INVESTIMENTOS\nB3 RV LISTADO C VISTA PETR4 ON N2 100 38,50 3.850,00 D\n",
        );
        let note = ExtractorCascade::with_defaults(&ProductSet::default())
            .run(&doc)
            .unwrap();
        assert_eq!(note.extractor, "direct");
        assert_eq!(note.trades.len(), 1);
        assert_eq!(note.trades[0].asset, "PETR4");
        assert_eq!(note.trades[0].maturity, None);
    }

    #[test]
    fn test_fee_only_note_is_returned_without_trades() {
        let doc = NoteDocument::from_text("n.txt", "Nr. nota: 55\nEmolumentos 1,20");
        let note = ExtractorCascade::with_defaults(&ProductSet::default())
            .run(&doc)
            .unwrap();
        assert!(!note.has_trades());
        assert_eq!(note.number.as_deref(), Some("55"));
    }

    #[test]
    fn test_empty_document_is_no_trades_error() {
        let doc = NoteDocument::from_text("vazio.txt", "página em branco");
        let err = ExtractorCascade::with_defaults(&ProductSet::default())
            .run(&doc)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NoteError>(),
            Some(NoteError::NoTrades(_))
        ));
    }
}
