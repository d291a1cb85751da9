//! Offline ingestion command

use crate::cli::IngestArgs;
use crate::config::HarvestConfig;
use crate::ingest::ChartIngestionService;
use crate::model::{InstrumentId, PageData};
use crate::repository::JsonFileHistoryRepository;
use anyhow::Context;
use colored::Colorize;
use std::sync::Arc;

/// Handle `harvest ingest` command
pub async fn handle_ingest(args: &IngestArgs, config: &HarvestConfig) -> anyhow::Result<String> {
    let content = tokio::fs::read_to_string(&args.page_data)
        .await
        .with_context(|| format!("reading page data {}", args.page_data.display()))?;
    let page: PageData = serde_json::from_str(&content)
        .with_context(|| format!("parsing page data {}", args.page_data.display()))?;

    let instrument = match &args.instrument {
        Some(id) => InstrumentId::new(id)?,
        None => page.instrument().clone(),
    };

    let repository = Arc::new(JsonFileHistoryRepository::open(&args.store).await?);
    let service = ChartIngestionService::new(repository, config.ingest.timezone()?);
    let inserted = service.ingest_chart_data(&page, &instrument).await?;

    Ok(format!(
        "{} Inserted {} new record(s) for {} ({}/{} slots succeeded) into {}",
        "✓".green(),
        inserted,
        instrument,
        page.succeeded_count(),
        page.total_slots(),
        args.store.display()
    ))
}
