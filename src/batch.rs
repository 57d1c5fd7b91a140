//! Batch processing of note files into a monthly report
//!
//! Inputs are a folder (every PDF in it) or an explicit file list. Each
//! file is extracted independently; a file that fails is recorded and the
//! batch goes on.

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::document::NoteDocument;
use crate::error::NoteError;
use crate::extractors::ExtractorCascade;
use crate::notes::BrokerageNote;
use crate::report::{MonthlyReport, ReportOptions};

const OUTPUT_SUFFIX: &str = "_exportado";
const FALLBACK_OUTPUT_NAME: &str = "notas_corretagem";

/// What the user picked
#[derive(Debug, Clone)]
pub enum InputSelection {
    Folder(PathBuf),
    Files(Vec<PathBuf>),
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

impl InputSelection {
    /// Files to process, in order
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let files = match self {
            InputSelection::Folder(dir) => {
                if !dir.is_dir() {
                    return Err(NoteError::InvalidInput(format!(
                        "{} is not a directory",
                        dir.display()
                    ))
                    .into());
                }
                let mut pdfs: Vec<PathBuf> = fs::read_dir(dir)
                    .with_context(|| format!("Failed to list {}", dir.display()))?
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.is_file() && has_extension(p, "pdf"))
                    .collect();
                pdfs.sort();
                if pdfs.is_empty() {
                    return Err(NoteError::InvalidInput(format!(
                        "no PDF files found in {}",
                        dir.display()
                    ))
                    .into());
                }
                pdfs
            }
            InputSelection::Files(files) => {
                if files.is_empty() {
                    return Err(NoteError::InvalidInput("no files selected".to_string()).into());
                }
                if let Some(missing) = files.iter().find(|f| !f.is_file()) {
                    return Err(NoteError::InvalidInput(format!(
                        "file not found: {}",
                        missing.display()
                    ))
                    .into());
                }
                files.clone()
            }
        };
        Ok(files)
    }

    /// `<dir>/<stem>_exportado.<ext>` for files, `<folder>/<name>_exportado.<ext>`
    /// for a folder. `output_dir` replaces the parent directory.
    pub fn default_output(&self, output_dir: Option<&Path>, extension: &str) -> PathBuf {
        let (parent, stem) = match self {
            InputSelection::Folder(dir) => {
                let name = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| FALLBACK_OUTPUT_NAME.to_string());
                (dir.clone(), name)
            }
            InputSelection::Files(files) => match files.first() {
                Some(first) => (
                    first.parent().map(Path::to_path_buf).unwrap_or_default(),
                    first
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_else(|| FALLBACK_OUTPUT_NAME.to_string()),
                ),
                None => (PathBuf::new(), FALLBACK_OUTPUT_NAME.to_string()),
            },
        };
        let parent = output_dir.map(Path::to_path_buf).unwrap_or(parent);
        parent.join(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub files_skipped: usize,
    pub notes: usize,
    pub trades: usize,
    pub months: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug)]
pub struct BatchOutcome {
    pub report: MonthlyReport,
    pub notes: Vec<BrokerageNote>,
    pub stats: BatchStats,
    pub failures: Vec<FileFailure>,
}

pub struct BatchRunner {
    cascade: ExtractorCascade,
    options: ReportOptions,
    show_progress: bool,
}

impl BatchRunner {
    pub fn new(cascade: ExtractorCascade, options: ReportOptions) -> Self {
        Self {
            cascade,
            options,
            show_progress: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show && std::io::stderr().is_terminal();
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::with_template("{bar:30} {pos}/{len} {wide_msg}") {
            bar.set_style(style);
        }
        bar
    }

    /// Process every file; fails only when nothing at all was extracted
    pub fn run(&self, files: &[PathBuf]) -> Result<BatchOutcome> {
        let mut report = MonthlyReport::new();
        let mut notes = Vec::new();
        let mut stats = BatchStats::default();
        let mut failures = Vec::new();
        let mut seen = HashSet::new();

        let bar = self.progress_bar(files.len());

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            bar.set_message(name.clone());

            let outcome = NoteDocument::load(path).and_then(|doc| {
                if !seen.insert(doc.content_hash.clone()) {
                    return Ok(None);
                }
                self.cascade.run(&doc).map(Some)
            });

            match outcome {
                Ok(Some(note)) => {
                    stats.files_processed += 1;
                    stats.trades += note.real_trades().count();
                    report.add_note(&note, &self.options);
                    notes.push(note);
                }
                Ok(None) => {
                    warn!("Skipping {}: same content as an earlier file", name);
                    stats.files_skipped += 1;
                }
                Err(e) => {
                    warn!("Failed to process {}: {:#}", name, e);
                    stats.files_failed += 1;
                    failures.push(FileFailure {
                        path: path.clone(),
                        error: format!("{:#}", e),
                    });
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        if report.is_empty() {
            return Err(NoteError::NoTrades("the selected files".to_string()).into());
        }

        stats.notes = report.note_count();
        stats.months = report.month_keys().count();
        info!(
            "Processed {} files: {} notes, {} trades, {} months",
            stats.files_processed, stats.notes, stats.trades, stats.months
        );

        Ok(BatchOutcome {
            report,
            notes,
            stats,
            failures,
        })
    }
}
