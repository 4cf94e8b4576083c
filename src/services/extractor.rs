use std::collections::HashSet;
use std::future::Future;

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::config::ExtractionConfig;
use crate::db::models::report::ReportRecord;
use crate::errors::ExtractError;
use crate::services::window::{windows, TimeWindow};

/// Where the rows for one window come from. The database repository
/// implements this; tests plug in fakes.
pub trait ReportSource {
    fn fetch_window(
        &self,
        window: &TimeWindow,
    ) -> impl Future<Output = Result<Vec<ReportRecord>>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractionPlan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub step_months: u32,
}

impl From<&ExtractionConfig> for ExtractionPlan {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            start: config.start,
            end: config.end,
            step_months: config.step_months,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    pub windows: usize,
    pub rows_fetched: usize,
    pub rows_kept: usize,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<ReportRecord>,
    pub summary: ExtractionSummary,
}

/// Runs the report query once per window, in order, then drops duplicate
/// `(cedula, report_id)` rows keeping the last one seen.
///
/// The first failing window aborts the run; rows from earlier windows are
/// discarded along with it.
pub async fn extract_reports<S: ReportSource>(
    source: &S,
    plan: &ExtractionPlan,
) -> Result<Extraction, ExtractError> {
    let mut frames: Vec<Vec<ReportRecord>> = Vec::new();
    let mut summary = ExtractionSummary::default();

    for window in windows(plan.start, plan.end, plan.step_months) {
        println!("Procesando bloque: {window}");

        let rows = source
            .fetch_window(&window)
            .await
            .map_err(|source| ExtractError::Window { window, source })?;

        tracing::debug!(%window, rows = rows.len(), "Window fetched");
        summary.windows += 1;
        summary.rows_fetched += rows.len();
        frames.push(rows);
    }

    let records = dedup_keep_last(frames.into_iter().flatten().collect());
    summary.rows_kept = records.len();

    Ok(Extraction { records, summary })
}

/// Keeps the last occurrence of every `(cedula, report_id)` key. Survivors
/// keep the relative order of their last occurrence.
pub fn dedup_keep_last(records: Vec<ReportRecord>) -> Vec<ReportRecord> {
    let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(records.len());
    let mut kept = Vec::with_capacity(records.len());

    for record in records.into_iter().rev() {
        if seen.insert((record.cedula.clone(), record.report_id)) {
            kept.push(record);
        }
    }

    kept.reverse();
    kept
}
