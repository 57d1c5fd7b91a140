//! Brokerage note model and the note-level field extraction shared by all
//! extractors

pub mod fees;
pub mod metadata;
pub mod model;

pub use model::{
    BrokerageNote, DebitCredit, FeeKind, Fees, NoteSummary, Side, Trade, TradeKind,
    PLACEHOLDER_ASSET, UNKNOWN_BROKER,
};

use crate::document::NoteDocument;

/// A note with header fields and fees filled in but no trades yet
pub fn skeleton(doc: &NoteDocument, extractor: &str) -> BrokerageNote {
    let mut note = BrokerageNote::new(&doc.file_name, extractor);
    metadata::fill(&mut note, doc);
    note.fees = fees::extract_fees(&doc.text);
    note
}
