//! `browse`: load a filtered list the way the list view does.
//!
//! The store is hydrated from the page address, a controller is bound to it,
//! and a simulated viewport scrolls down the rendered rows. Pages are only
//! requested when the scroll trigger fires for the list-end sentinel.

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use url::Url;

use super::{CommandOutput, filters_from_args, filters_json};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::{DirectoryError, Result};
use crate::feed::{ApplyOutcome, FeedEvent, ListController, RequestTag, settled};
use crate::params::encode;
use crate::remote::{FetchError, HttpListSource, Resource};
use crate::scroll::{ScrollTrigger, SentinelId, TriggerDecision, ViewportObserver};
use crate::store::FilterStore;
use crate::sync::UrlSynchronizer;

/// Height of one rendered row, in the unit of `prefetch_margin`.
const ROW_HEIGHT: u64 = 48;
const VIEWPORT_HEIGHT: u64 = 800;
const SENTINEL: SentinelId = SentinelId::new(1);

pub struct BrowseOptions {
    pub resource: Resource,
    /// Page address to hydrate from; `filters` are used when absent.
    pub url: Option<String>,
    pub filters: Vec<(String, Vec<String>)>,
    pub limit: Option<u32>,
    /// Upper bound on loaded pages.
    pub pages: u32,
}

fn sentinel_offset(rows: usize) -> u64 {
    rows as u64 * ROW_HEIGHT
}

async fn wait(
    events: &mut broadcast::Receiver<FeedEvent>,
    tag: RequestTag,
) -> Result<ApplyOutcome> {
    settled(events, tag)
        .await
        .ok_or_else(|| DirectoryError::Other(format!("page {} request was abandoned", tag.page)))
}

pub async fn cmd_browse(options: BrowseOptions, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let resource = options.resource;
    let limit = options.limit.unwrap_or(config.page_size).max(1);
    let max_pages = options.pages.max(1);

    let location = match &options.url {
        Some(url) => Url::parse(url)?.query().unwrap_or_default().to_string(),
        None => encode(&filters_from_args(options.filters)),
    };

    let mut sync = UrlSynchronizer::new(Arc::new(FilterStore::new()));
    let filters = sync.hydrate(&location);

    let source: HttpListSource = HttpListSource::from_config(&config, resource)?;
    let controller = ListController::new(source, limit)?;
    let _binding = controller.bind_store(&sync);
    let mut events = controller.subscribe();

    let tag = controller
        .start(&sync)
        .ok_or_else(|| DirectoryError::Other("filters are not hydrated".to_string()))?;
    let mut failure: Option<FetchError> = match wait(&mut events, tag).await? {
        ApplyOutcome::Failed(err) => Some(err),
        _ => None,
    };
    let mut pages = 1;

    let mut viewport = ViewportObserver::new(u64::from(config.prefetch_margin));
    let mut trigger = ScrollTrigger::new();
    trigger.observe(SENTINEL);
    viewport.attach(SENTINEL, sentinel_offset(controller.snapshot().items.len()));

    let mut scroll_top = 0;
    while failure.is_none() && pages < max_pages && controller.gate().has_more {
        let mut decision = viewport
            .on_scroll(scroll_top, VIEWPORT_HEIGHT)
            .map(|(id, edge)| trigger.on_visibility(id, edge, controller.gate()));

        while decision == Some(TriggerDecision::LoadNext) && pages < max_pages {
            let Some(tag) = controller.load_next() else {
                break;
            };
            let outcome = wait(&mut events, tag).await?;
            let grew = outcome.grew();
            if matches!(outcome, ApplyOutcome::Appended { .. }) && grew {
                pages += 1;
            }
            if let ApplyOutcome::Failed(err) = outcome {
                failure = Some(err);
                break;
            }

            let rows = controller.snapshot().items.len();
            decision = match viewport.move_sentinel(sentinel_offset(rows)) {
                Some((id, edge)) => Some(trigger.on_visibility(id, edge, controller.gate())),
                None => Some(trigger.on_load_complete(grew, controller.gate())),
            };
        }

        let rows = controller.snapshot().items.len();
        if scroll_top > sentinel_offset(rows) + VIEWPORT_HEIGHT + viewport.root_margin() {
            // Scrolled past the end without the trigger firing again.
            break;
        }
        scroll_top += VIEWPORT_HEIGHT / 2;
    }

    trigger.detach();
    viewport.detach();
    let snapshot = controller.snapshot();
    controller.shutdown();

    tracing::debug!(
        resource = %resource,
        pages,
        loaded = snapshot.pagination.loaded_item_count,
        "browse finished"
    );

    let label_field = resource.label_field();
    let total = snapshot.pagination.total_items.unwrap_or(0);
    let mut text = String::new();
    text.push_str(&format!(
        "{} {}\n",
        resource.to_string().cyan().bold(),
        format!("({} of {} loaded, {} page(s))", snapshot.items.len(), total, pages).dimmed()
    ));
    if !filters.is_empty() {
        text.push_str(&format!("{} {}\n", "filters:".dimmed(), encode(&filters)));
    }
    for item in &snapshot.items {
        text.push_str(&format!("  {}\n", item_label(item, label_field)));
    }
    if let Some(err) = &failure {
        text.push_str(&format!("{} {}\n", "error:".red(), err));
        if err.is_transient() {
            text.push_str(&format!("{}\n", "the backend may recover; run browse again".dimmed()));
        }
    }

    CommandOutput::new(json!({
        "resource": resource.path(),
        "filters": filters_json(&filters),
        "query": encode(&filters),
        "page": snapshot.pagination.page,
        "limit": snapshot.pagination.limit,
        "total_items": snapshot.pagination.total_items,
        "loaded_item_count": snapshot.pagination.loaded_item_count,
        "items": snapshot.items,
        "error": failure.as_ref().map(|err| json!({
            "message": err.to_string(),
            "status": err.status(),
            "transient": err.is_transient(),
        })),
    }))
    .with_text(text.trim_end().to_string())
    .print(output)?;

    match failure {
        Some(err) => Err(DirectoryError::Fetch(err)),
        None => Ok(()),
    }
}

fn item_label(item: &Value, label_field: &str) -> String {
    match item.get(label_field).and_then(Value::as_str) {
        Some(label) => label.to_string(),
        None => item
            .get("id")
            .map(|id| format!("#{}", id.to_string().trim_matches('"')))
            .unwrap_or_else(|| item.to_string()),
    }
}
