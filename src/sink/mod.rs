pub mod google;
pub mod memory;
pub mod csv_dump;

use async_trait::async_trait;
use chrono::{ DateTime, Local };
use log::info;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;
use crate::models::outcome::{ header_cells, OutcomeRow, HEADER };
use self::google::GoogleSheetsSink;
use self::memory::MemorySink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("sheet '{0}' does not exist")]
    MissingSheet(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Spreadsheet-like store made of named sheets. Rows are 1-based.
#[async_trait]
pub trait TabularSink: Send + Sync {
    /// Creates the sheet when it does not exist yet.
    async fn ensure_sheet(&self, sheet: &str) -> Result<(), SinkError>;

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>, SinkError>;

    async fn write_row(&self, sheet: &str, row: usize, values: Vec<Value>) -> Result<(), SinkError>;

    /// Adds rows below the existing content of the sheet.
    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<Value>>) -> Result<(), SinkError>;
}

pub async fn create_sink(args: &Args) -> Result<Arc<dyn TabularSink>, SinkError> {
    match args.sink_type.to_lowercase().as_str() {
        "google" => {
            let sink = GoogleSheetsSink::from_args(args).await?;
            Ok(Arc::new(sink))
        }
        "memory" => Ok(Arc::new(MemorySink::new())),
        other => Err(SinkError::Config(format!("Unsupported sink type: {}", other))),
    }
}

/// Makes sure the header sits in row 1, then appends `rows` under whatever
/// the sheet already holds.
pub async fn publish(
    sink: &dyn TabularSink,
    sheet: &str,
    rows: &[OutcomeRow]
) -> Result<(), SinkError> {
    sink.ensure_sheet(sheet).await?;

    let first_row = sink.read_row(sheet, 1).await?;
    if !first_row.iter().map(String::as_str).eq(HEADER.iter().copied()) {
        info!("Writing header into sheet '{}'", sheet);
        sink.write_row(sheet, 1, header_cells()).await?;
    }

    if rows.is_empty() {
        info!("No rows to write into sheet '{}'", sheet);
        return Ok(());
    }

    let cells = rows.iter().map(OutcomeRow::to_cells).collect();
    sink.append_rows(sheet, cells).await?;
    info!("Wrote {} rows into sheet '{}'", rows.len(), sheet);
    Ok(())
}

pub async fn mark_updated(
    sink: &dyn TabularSink,
    sheet: &str,
    label: &str,
    at: DateTime<Local>
) -> Result<(), SinkError> {
    sink.ensure_sheet(sheet).await?;
    let stamp = at.format("%Y-%m-%d %H:%M:%S").to_string();
    sink.write_row(sheet, 1, vec![Value::from(label), Value::from(stamp.clone())]).await?;
    info!("Update time {} written into sheet '{}'", stamp, sheet);
    Ok(())
}
