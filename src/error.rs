//! Error handling
//!
//! Domain failures are `NoteError` variants; propagation goes through
//! `anyhow` so callers can attach file names with `.context(...)`.

use thiserror::Error;

/// Failures while reading, extracting or exporting brokerage notes
#[derive(Error, Debug)]
pub enum NoteError {
    #[error("pdf error: {0}")]
    Pdf(String),

    #[error("no transactions found in {0}")]
    NoTrades(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("report error: {0}")]
    Report(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias used across the crate
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = NoteError::NoTrades("nota.pdf".to_string());
        assert_eq!(err.to_string(), "no transactions found in nota.pdf");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> = Err(anyhow::Error::new(NoteError::Pdf(
            "unexpected EOF".to_string(),
        )))
        .context("failed to read 0001_20250102.pdf");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("0001_20250102.pdf"));
        assert!(format!("{:?}", err).contains("unexpected EOF"));
        assert!(err.downcast_ref::<NoteError>().is_some());
    }

    #[test]
    fn test_note_error_variants() {
        assert!(NoteError::InvalidInput("x".into())
            .to_string()
            .starts_with("invalid input"));
        assert!(NoteError::Report("x".into())
            .to_string()
            .starts_with("report error"));
        assert!(NoteError::Config("x".into())
            .to_string()
            .starts_with("config error"));
    }
}
