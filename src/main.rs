use anyhow::Context;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use report_extract::config::AppConfig;
use report_extract::db::connection;
use report_extract::db::models::report::ReportRepository;
use report_extract::services::converter::fill_plain_text;
use report_extract::services::extractor::{extract_reports, Extraction, ExtractionPlan};
use report_extract::services::preview::render_preview;
use report_extract::services::text_extract::build_host;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the progress lines and the preview
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    config.validate()?;
    tracing::info!("Configuration loaded (env: {})", std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into()));

    let run_id = Uuid::new_v4();
    run(config)
        .instrument(tracing::info_span!("extraction", %run_id))
        .await
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let plan = ExtractionPlan::from(&config.extraction);
    tracing::info!(
        start = %plan.start,
        end = %plan.end,
        step_months = plan.step_months,
        "Starting report extraction"
    );

    let pool = connection::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;
    let reports = ReportRepository::new(pool);

    let Extraction { mut records, summary } = extract_reports(&reports, &plan)
        .await
        .context("Extraction aborted")?;
    tracing::info!(
        windows = summary.windows,
        rows_fetched = summary.rows_fetched,
        rows_kept = summary.rows_kept,
        "Extraction finished"
    );

    if config.conversion.enabled {
        let conversion = config.conversion.clone();
        let (converted, fill) = tokio::task::spawn_blocking(move || {
            let mut host = build_host(&conversion);
            let fill = fill_plain_text(&mut records, host.as_mut(), &conversion.extension);
            (records, fill)
        })
        .await
        .context("Document conversion task panicked")?;
        records = converted;

        tracing::info!(
            converted = fill.converted,
            failed = fill.failed,
            skipped = fill.skipped,
            "Plain text conversion finished"
        );
    }

    println!("{}", render_preview(&records, config.extraction.preview_rows));
    Ok(())
}
