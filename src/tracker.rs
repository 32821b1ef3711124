use chrono::Local;
use log::{ error, info, warn };
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Args;
use crate::models::ProductId;
use crate::pipeline::{ CycleStats, Pipeline };
use crate::sink::csv_dump::write_csv;
use crate::sink::{ mark_updated, publish, SinkError, TabularSink };
use crate::source::{ fetch_all_events, load_chat_product_links, EventSource };

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub target_products: Vec<ProductId>,
    pub page_delay: Duration,
    pub poll_interval: Duration,
    pub chats_sheet: String,
    pub info_sheet: String,
    pub status_label: String,
    pub csv_dir: Option<PathBuf>,
}

impl From<&Args> for TrackerSettings {
    fn from(args: &Args) -> Self {
        Self {
            target_products: args.target_nm_ids.clone(),
            page_delay: Duration::from_millis(args.page_delay_ms),
            poll_interval: Duration::from_secs(args.update_interval_secs),
            chats_sheet: args.chats_sheet.clone(),
            info_sheet: args.info_sheet.clone(),
            status_label: args.status_label.clone(),
            csv_dir: args.csv_dir.as_ref().map(PathBuf::from),
        }
    }
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub stats: CycleStats,
    pub pages: usize,
    pub fetch_interrupted: bool,
}

/// Drives the poll loop. The chat to product links are fetched once in
/// `start`; every cycle refetches the whole events feed.
pub struct ChatTracker {
    source: Arc<dyn EventSource>,
    sink: Arc<dyn TabularSink>,
    pipeline: Pipeline,
    settings: TrackerSettings,
}

impl ChatTracker {
    pub async fn start(
        source: Arc<dyn EventSource>,
        sink: Arc<dyn TabularSink>,
        settings: TrackerSettings
    ) -> Self {
        let links = load_chat_product_links(source.as_ref()).await;
        let pipeline = Pipeline::new(links, settings.target_products.iter().copied());
        Self { source, sink, pipeline, settings }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, SinkError> {
        if self.pipeline.chat_products().is_empty() {
            warn!("No chat-nmID links loaded; no chat can match the target nmIDs");
        }

        let fetch = fetch_all_events(self.source.as_ref(), self.settings.page_delay).await;
        if let Some(e) = &fetch.interrupted {
            warn!("Events fetch ended early ({}); continuing with {} events", e, fetch.events.len());
        }
        let pages = fetch.pages;
        let fetch_interrupted = fetch.interrupted.is_some();

        let output = self.pipeline.run(fetch.events);

        publish(self.sink.as_ref(), &self.settings.chats_sheet, &output.rows).await?;
        mark_updated(
            self.sink.as_ref(),
            &self.settings.info_sheet,
            &self.settings.status_label,
            Local::now()
        ).await?;

        if let Some(dir) = &self.settings.csv_dir {
            if let Err(e) = write_csv(dir, &output.rows, Local::now()) {
                error!("Failed to write CSV copy into {}: {}", dir.display(), e);
            }
        }

        info!(
            "Cycle done: events={} chats={} dialogues={} relevant={} rows={}",
            output.stats.events,
            output.stats.chats,
            output.stats.dialogues,
            output.stats.relevant,
            output.stats.rows
        );
        Ok(CycleReport { stats: output.stats, pages, fetch_interrupted })
    }

    pub async fn run(&self) {
        loop {
            if let Err(e) = self.run_cycle().await {
                error!("Failed to publish cycle results: {}", e);
            }
            info!("sleep {:?}", self.settings.poll_interval);
            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
