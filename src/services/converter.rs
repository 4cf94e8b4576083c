use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempPath;

use crate::db::models::report::ReportRecord;

/// A document-editing host that can open a file and hand back its plain text.
///
/// One session per conversion: `open` is called once and `close` follows it
/// whether or not `open` succeeded.
pub trait DocumentHost {
    fn open(&mut self, path: &Path) -> Result<String>;
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Text(String),
    Failed(String),
    NoContent,
}

impl ConversionOutcome {
    pub fn text(&self) -> Option<&str> {
        match self {
            ConversionOutcome::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ConversionOutcome::Failed(_))
    }

    /// Flattens the outcome to the old string contract: the text itself,
    /// `Error: <message>` on failure, nothing for an absent blob.
    pub fn to_legacy_string(&self) -> Option<String> {
        match self {
            ConversionOutcome::Text(text) => Some(text.clone()),
            ConversionOutcome::Failed(message) => Some(format!("Error: {message}")),
            ConversionOutcome::NoContent => None,
        }
    }
}

/// Converts one document blob to trimmed plain text through `host`.
///
/// Never fails: host and I/O errors come back as `Failed`. The temporary
/// file is removed on every path.
pub fn convert_blob<H: DocumentHost + ?Sized>(
    blob: Option<&[u8]>,
    host: &mut H,
    extension: &str,
) -> ConversionOutcome {
    let Some(bytes) = blob else {
        return ConversionOutcome::NoContent;
    };

    match run_host(bytes, host, extension) {
        Ok(text) => ConversionOutcome::Text(text.trim().to_string()),
        Err(e) => {
            tracing::warn!("Document conversion failed: {e:#}");
            ConversionOutcome::Failed(format!("{e:#}"))
        }
    }
}

fn run_host<H: DocumentHost + ?Sized>(bytes: &[u8], host: &mut H, extension: &str) -> Result<String> {
    let path = write_temp_document(bytes, extension)?;

    let opened = host.open(&path);
    let closed = host.close();

    let text = opened.context("Document host could not read the document")?;
    closed.context("Document host did not close cleanly")?;
    Ok(text)
}

/// Writes the blob to a uniquely named file. The handle is closed so the
/// host can open the file; the path deletes the file when dropped.
fn write_temp_document(bytes: &[u8], extension: &str) -> Result<TempPath> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let mut tmp = tempfile::Builder::new()
        .prefix("report-")
        .suffix(&suffix)
        .tempfile()
        .context("Failed to create temp file")?;
    tmp.write_all(bytes)
        .context("Failed to write document to temp file")?;
    tmp.flush()?;

    Ok(tmp.into_temp_path())
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FillSummary {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Fills `document_plain_text` for records that have a document but no text.
///
/// Failed conversions are logged and leave the field untouched.
pub fn fill_plain_text<H: DocumentHost + ?Sized>(
    records: &mut [ReportRecord],
    host: &mut H,
    extension: &str,
) -> FillSummary {
    let mut summary = FillSummary::default();

    for record in records.iter_mut() {
        let has_text = record
            .document_plain_text
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if has_text {
            summary.skipped += 1;
            continue;
        }

        match convert_blob(record.document.as_deref(), host, extension) {
            ConversionOutcome::Text(text) => {
                record.document_plain_text = Some(text);
                summary.converted += 1;
            }
            ConversionOutcome::Failed(message) => {
                tracing::warn!(report_id = record.report_id, "Plain text not filled: {message}");
                summary.failed += 1;
            }
            ConversionOutcome::NoContent => summary.skipped += 1,
        }
    }

    summary
}
