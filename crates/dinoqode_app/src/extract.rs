use std::path::Path;

use anyhow::Context;
use dinoqode_core::{ExtractedRecord, ItemKind};
use dinoqode_engine::{fetch_page, read_page, FetchSettings, ReqwestFetcher, ServiceRegistry};
use dinoqode_logging::dq_info;

/// Builds the card line for one store page, fetched live or read from a
/// saved copy.
pub async fn extract_record(
    url: &str,
    saved_html: Option<&Path>,
    kind: &str,
    fetch: FetchSettings,
) -> anyhow::Result<ExtractedRecord> {
    let item_kind = ItemKind::from_prompt(kind)?;

    let page = match saved_html {
        Some(path) => read_page(path, url)?,
        None => {
            let fetcher = ReqwestFetcher::new(fetch);
            fetch_page(&fetcher, url)
                .await
                .with_context(|| format!("failed to load {url}"))?
        }
    };

    let registry = ServiceRegistry::with_default_services();
    let record = registry.extract(&page, item_kind)?;
    dq_info!("Card line for \"{}\" by {} is ready", record.title, record.artist);
    Ok(record)
}

/// Text printed for a record: the card line, or the record as JSON.
pub fn render(record: &ExtractedRecord, json: bool) -> anyhow::Result<String> {
    if json {
        serde_json::to_string_pretty(record).context("failed to serialize record")
    } else {
        Ok(record.encode().to_string())
    }
}
