use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use sqlx::{PgPool, Row};

use crate::services::extractor::ReportSource;
use crate::services::window::TimeWindow;

/// One row of the report join, in the column order the query returns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub patient_key: i64,
    /// External patient identifier (national id number).
    pub cedula: String,
    pub report_id: i64,
    pub report_date: NaiveDateTime,
    /// Whole years between now and the birth date.
    pub age: i32,
    pub modality_description: Option<String>,
    pub study_description: String,
    pub document: Option<Vec<u8>>,
    pub document_plain_text: Option<String>,
}

pub const COLUMNS: [&str; 9] = [
    "patient_key",
    "cedula",
    "report_id",
    "report_date",
    "age",
    "modality_description",
    "study_description",
    "document",
    "document_plain_text",
];

/// Adult renal ultrasound reports created within `[$1, $2]`.
///
/// Only the window bounds are bound; the age floor, procedure codes and study
/// description are part of the statement.
pub const REPORT_QUERY: &str = "
SELECT
    sw.patient_person_key::BIGINT AS patient_key,
    pil.patient_id::TEXT AS cedula,
    r.report_key::BIGINT AS report_id,
    r.report_created_date AS report_date,
    DATE_PART('year', AGE(CURRENT_DATE, per.birth_date))::INT4 AS age,
    rc.description AS modality_description,
    s.description AS study_description,
    r.document AS document,
    r.document_plain_text AS document_plain_text
FROM site_worklist sw
INNER JOIN sps s
    ON sw.sps_id = s.sps_id
INNER JOIN patient pat
    ON sw.patient_person_key = pat.patient_person_key
INNER JOIN person per
    ON per.person_key = pat.patient_person_key
INNER JOIN patient_id_list pil
    ON pil.patient_person_key = per.person_key
INNER JOIN report r
    ON sw.report_key = r.report_key
INNER JOIN rp_code rc
    ON sw.rp_code_key = rc.rp_code_key
WHERE
    r.report_created_date BETWEEN $1 AND $2
    AND DATE_PART('year', AGE(CURRENT_DATE, per.birth_date)) >= 18
    AND sw.rp_code_key::TEXT IN ('12150', '12156', '12149', '12151', '12154')
    AND s.description IN ('US - Renal')
";

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_in_window(&self, window: &TimeWindow) -> Result<Vec<ReportRecord>> {
        let rows = sqlx::query(REPORT_QUERY)
            .bind(window.start)
            .bind(window.end)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query reports")?;

        rows.iter().map(Self::map_row).collect()
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<ReportRecord> {
        Ok(ReportRecord {
            patient_key: row.try_get("patient_key").context("Failed to get patient_key")?,
            cedula: row.try_get("cedula").context("Failed to get cedula")?,
            report_id: row.try_get("report_id").context("Failed to get report_id")?,
            report_date: row.try_get("report_date").context("Failed to get report_date")?,
            age: row.try_get("age").context("Failed to get age")?,
            modality_description: row
                .try_get("modality_description")
                .context("Failed to get modality_description")?,
            study_description: row
                .try_get("study_description")
                .context("Failed to get study_description")?,
            document: row.try_get("document").context("Failed to get document")?,
            document_plain_text: row
                .try_get("document_plain_text")
                .context("Failed to get document_plain_text")?,
        })
    }
}

impl ReportSource for ReportRepository {
    async fn fetch_window(&self, window: &TimeWindow) -> Result<Vec<ReportRecord>> {
        self.find_in_window(window).await
    }
}
