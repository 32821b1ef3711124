pub mod models;
pub mod pipeline;
pub mod source;
pub mod sink;
pub mod tracker;
pub mod cli;

use cli::Args;
use log::info;
use sink::create_sink;
use source::wb::WbEventSource;
use std::error::Error;
use std::sync::Arc;
use tracker::{ ChatTracker, TrackerSettings };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Chats URL: {}", args.chats_url);
    info!("Events URL: {}", args.events_url);
    info!("Target nmIDs: {:?}", args.target_nm_ids);
    info!("Page Delay: {}ms", args.page_delay_ms);
    info!("Update Interval: {}s", args.update_interval_secs);
    info!("HTTP Timeout: {}s", args.http_timeout_secs);
    info!("Sink Type: {}", args.sink_type);
    info!("Spreadsheet ID: {}", args.spreadsheet_id.as_deref().unwrap_or("not set"));
    info!("Chats Sheet: {}", args.chats_sheet);
    info!("Info Sheet: {}", args.info_sheet);
    if let Some(dir) = &args.csv_dir {
        info!("CSV Directory: {}", dir);
    }
    info!("-------------------------");

    let source = Arc::new(WbEventSource::from_args(&args)?);
    let sink = create_sink(&args).await?;
    let tracker = ChatTracker::start(source, sink, TrackerSettings::from(&args)).await;
    tracker.run().await;

    Ok(())
}
