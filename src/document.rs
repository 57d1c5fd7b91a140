// Note document - the text layer of one brokerage-note file
//
// PDFs go through pdf-extract. Files ending in .txt are taken as an
// already-extracted text layer, which is how fixtures and notes dumped by
// other tools are fed in.

use anyhow::{Context, Result};
use pdf_extract::extract_text_from_mem;
use std::fmt::Display;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::error::NoteError;

#[derive(Debug, Clone)]
pub struct NoteDocument {
    pub path: PathBuf,
    pub file_name: String,
    pub text: String,
    /// BLAKE3 hash of the raw file bytes
    pub content_hash: String,
}

impl NoteDocument {
    /// Build a document from text that was already extracted
    pub fn from_text(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let text = text.into();
        let content_hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        Self {
            path: PathBuf::from(&file_name),
            file_name,
            text,
            content_hash,
        }
    }

    /// Read a file from disk and extract its text
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_bytes(path, &bytes)
    }

    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

        let text = if is_text {
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            info!("Extracting text from PDF: {}", file_name);
            guarded_extract(&file_name, || extract_text_from_mem(bytes))?
        };
        debug!("{}: {} characters of text", file_name, text.len());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            text,
            content_hash: blake3::hash(bytes).to_hex().to_string(),
        })
    }

    /// Non-blank lines, trimmed
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Text upper-cased with accents removed, for locating section markers
    /// such as `NEGÓCIOS REALIZADOS` regardless of how they were encoded
    pub fn folded_text(&self) -> String {
        fold_accents(&self.text)
    }
}

/// Run a PDF text extraction; its errors and panics both become `NoteError::Pdf`
fn guarded_extract<F, E>(file_name: &str, extract: F) -> Result<String>
where
    F: FnOnce() -> std::result::Result<String, E>,
    E: Display,
{
    match panic::catch_unwind(AssertUnwindSafe(extract)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(NoteError::Pdf(format!("{}: {}", file_name, e)).into()),
        Err(_) => {
            warn!("PDF parser panicked on {}", file_name);
            Err(NoteError::Pdf(format!("{}: unreadable PDF (parser panicked)", file_name)).into())
        }
    }
}

pub fn fold_accents(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_uppercase()
}
