use sha2::{Digest, Sha256};

use crate::db::models::report::{ReportRecord, COLUMNS};

const MAX_CELL_CHARS: usize = 40;

/// Renders the first `limit` records as an aligned text table, with the
/// total shape on the last line.
pub fn render_preview(records: &[ReportRecord], limit: usize) -> String {
    if records.is_empty() {
        return "Empty table (0 rows)".to_string();
    }

    let mut header = vec![String::new()];
    header.extend(COLUMNS.iter().map(|c| c.to_string()));

    let mut rows = vec![header];
    for (index, record) in records.iter().take(limit).enumerate() {
        let mut row = vec![index.to_string()];
        row.extend(cells(record));
        rows.push(row);
    }

    let mut widths = vec![0usize; COLUMNS.len() + 1];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out.push_str(&format!("\n[{} rows x {} columns]", records.len(), COLUMNS.len()));
    out
}

fn cells(record: &ReportRecord) -> Vec<String> {
    vec![
        record.patient_key.to_string(),
        record.cedula.clone(),
        record.report_id.to_string(),
        record.report_date.format("%Y-%m-%d %H:%M:%S").to_string(),
        record.age.to_string(),
        optional_text(record.modality_description.as_deref()),
        truncate(&record.study_description),
        blob_summary(record.document.as_deref()),
        optional_text(record.document_plain_text.as_deref()),
    ]
}

fn optional_text(value: Option<&str>) -> String {
    value.map(truncate).unwrap_or_else(|| "None".to_string())
}

fn truncate(text: &str) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CELL_CHARS {
        return flat;
    }
    let head: String = flat.chars().take(MAX_CELL_CHARS - 3).collect();
    format!("{head}...")
}

fn blob_summary(blob: Option<&[u8]>) -> String {
    match blob {
        Some(bytes) => {
            let digest = Sha256::digest(bytes);
            let hex: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
            format!("<{} bytes sha256:{hex}>", bytes.len())
        }
        None => "None".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(report_id: i64) -> ReportRecord {
        ReportRecord {
            patient_key: 77,
            cedula: "0912345678".to_string(),
            report_id,
            report_date: NaiveDate::from_ymd_opt(2016, 2, 29)
                .unwrap()
                .and_hms_opt(14, 5, 0)
                .unwrap(),
            age: 61,
            modality_description: None,
            study_description: "US - Renal".to_string(),
            document: Some(b"abc".to_vec()),
            document_plain_text: Some("Rinon derecho:\n  mide 10 cm".to_string()),
        }
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_preview(&[], 20), "Empty table (0 rows)");
    }

    #[test]
    fn test_preview_limits_rows_and_reports_shape() {
        let records: Vec<_> = (1..=25).map(record).collect();
        let preview = render_preview(&records, 20);

        let lines: Vec<&str> = preview.lines().collect();
        // header + 20 rows + blank + shape
        assert_eq!(lines.len(), 23);
        assert!(lines[0].contains("patient_key"));
        assert!(lines[0].contains("document_plain_text"));
        assert!(lines[20].starts_with("19 "));
        assert_eq!(lines[22], "[25 rows x 9 columns]");
    }

    #[test]
    fn test_cells_are_rendered_readably() {
        let preview = render_preview(&[record(5)], 20);
        // sha256("abc") starts with ba7816bf
        assert!(preview.contains("<3 bytes sha256:ba7816bf>"), "{preview}");
        assert!(preview.contains("2016-02-29 14:05:00"));
        assert!(preview.contains("Rinon derecho: mide 10 cm"));
        assert!(preview.contains("None"));
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "x".repeat(100);
        let cell = truncate(&long);
        assert_eq!(cell.chars().count(), MAX_CELL_CHARS);
        assert!(cell.ends_with("..."));
    }
}
