use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::config::{ConversionConfig, HostKind};
use crate::services::converter::DocumentHost;

/// Builds the host selected in configuration.
pub fn build_host(config: &ConversionConfig) -> Box<dyn DocumentHost> {
    match config.host {
        HostKind::Soffice => Box::new(SofficeHost::new(&config.program)),
        HostKind::Docx => Box::new(DocxHost),
    }
}

/// Drives a headless office suite as a subprocess. Handles legacy binary
/// `.doc` files as well as OOXML.
pub struct SofficeHost {
    program: String,
    scratch: Option<TempDir>,
}

impl SofficeHost {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            scratch: None,
        }
    }
}

impl DocumentHost for SofficeHost {
    fn open(&mut self, path: &Path) -> Result<String> {
        let outdir = tempfile::tempdir().context("Failed to create conversion output directory")?;

        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--norestore")
            .arg("--convert-to")
            .arg("txt:Text (encoded):UTF8")
            .arg("--outdir")
            .arg(outdir.path())
            .arg(path)
            .output()
            .with_context(|| format!("Failed to run {}; is LibreOffice installed?", self.program))?;

        // dropped (and removed) by close()
        let outdir = self.scratch.insert(outdir);

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} exited with {}: {stderr}", self.program, output.status);
        }

        let stem = path
            .file_stem()
            .context("Document path has no file name")?
            .to_string_lossy();
        let converted = outdir.path().join(format!("{stem}.txt"));
        let bytes = std::fs::read(&converted).with_context(|| {
            format!(
                "{} produced no text output; the document may be corrupt",
                self.program
            )
        })?;

        let text = String::from_utf8(bytes).context("Converted text is not valid UTF-8")?;
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(dir) = self.scratch.take() {
            dir.close().context("Failed to remove conversion output")?;
        }
        Ok(())
    }
}

/// In-process reader for OOXML (`.docx`) blobs. Legacy binary documents are
/// rejected with a parse error.
pub struct DocxHost;

impl DocumentHost for DocxHost {
    fn open(&mut self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).context("Failed to read document file")?;
        let doc = docx_rs::read_docx(&bytes).map_err(|e| anyhow::anyhow!("Failed to read DOCX: {e}"))?;

        let mut text = String::new();
        for child in doc.document.children.iter() {
            collect_docx_text(child, &mut text);
        }
        Ok(text)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

fn collect_docx_text(child: &docx_rs::DocumentChild, out: &mut String) {
    match child {
        docx_rs::DocumentChild::Paragraph(p) => {
            push_paragraph(p, out);
            out.push('\n');
        }
        docx_rs::DocumentChild::Table(table) => {
            for row in &table.rows {
                let docx_rs::TableChild::TableRow(tr) = row;
                for cell in &tr.cells {
                    let docx_rs::TableRowChild::TableCell(tc) = cell;
                    for tc_child in &tc.children {
                        if let docx_rs::TableCellContent::Paragraph(p) = tc_child {
                            push_paragraph(p, out);
                            out.push('\t');
                        }
                    }
                }
                out.push('\n');
            }
        }
        _ => {}
    }
}

fn push_paragraph(p: &docx_rs::Paragraph, out: &mut String) {
    for run_child in &p.children {
        if let docx_rs::ParagraphChild::Run(run) = run_child {
            for rc in &run.children {
                if let docx_rs::RunChild::Text(t) = rc {
                    out.push_str(&t.text);
                }
            }
        }
    }
}
