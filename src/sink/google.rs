use async_trait::async_trait;
use log::{ info, debug };
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde_json::{ json, Value };
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;
use yup_oauth2::{ read_service_account_key, AccessToken, ServiceAccountAuthenticator, ServiceAccountKey };

use super::{ SinkError, TabularSink };
use crate::cli::Args;

const SHEETS_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];
const NEW_SHEET_ROWS: u32 = 1000;
const NEW_SHEET_COLUMNS: u32 = 26;

enum SheetsAuth {
    Static(String),
    ServiceAccount {
        key: ServiceAccountKey,
        cached: Mutex<Option<AccessToken>>,
    },
}

async fn get_access_token(key: ServiceAccountKey) -> Result<AccessToken, SinkError> {
    let auth = ServiceAccountAuthenticator::builder(key)
        .build().await
        .map_err(|e| SinkError::Auth(e.to_string()))?;

    auth.token(&SHEETS_SCOPES).await.map_err(|e| SinkError::Auth(e.to_string()))
}

impl SheetsAuth {
    async fn bearer(&self) -> Result<String, SinkError> {
        match self {
            SheetsAuth::Static(token) => Ok(token.clone()),
            SheetsAuth::ServiceAccount { key, cached } => {
                let mut guard = cached.lock().await;
                let fresh = match guard.as_ref() {
                    Some(token) if !token.is_expired() => token.clone(),
                    _ => {
                        debug!("Requesting a new Google access token");
                        get_access_token(key.clone()).await?
                    }
                };
                let bearer = fresh
                    .token()
                    .ok_or_else(|| SinkError::Auth("OAuth token was None".to_string()))?
                    .to_string();
                *guard = Some(fresh);
                Ok(bearer)
            }
        }
    }
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets API v4 client bound to one spreadsheet.
pub struct GoogleSheetsSink {
    client: reqwest::Client,
    base_url: String,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl GoogleSheetsSink {
    pub async fn from_args(args: &Args) -> Result<Self, SinkError> {
        let spreadsheet_id = args.spreadsheet_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| SinkError::Config("SPREADSHEET_ID is required for the google sink".to_string()))?;
        let timeout = Duration::from_secs(args.http_timeout_secs);

        match args.google_access_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => {
                info!("Google Sheets sink uses a static access token");
                Self::with_static_token(&args.sheets_base_url, &spreadsheet_id, token, timeout)
            }
            None => {
                info!(
                    "Google Sheets sink uses service account key {}",
                    args.service_account_path
                );
                let key = read_service_account_key(Path::new(&args.service_account_path)).await
                    .map_err(|e| SinkError::Auth(
                        format!("Failed to load SA key from {}: {}", args.service_account_path, e)
                    ))?;
                Self::with_auth(&args.sheets_base_url, &spreadsheet_id, SheetsAuth::ServiceAccount {
                    key,
                    cached: Mutex::new(None),
                }, timeout)
            }
        }
    }

    pub fn with_static_token(
        base_url: &str,
        spreadsheet_id: &str,
        token: &str,
        timeout: Duration
    ) -> Result<Self, SinkError> {
        Self::with_auth(base_url, spreadsheet_id, SheetsAuth::Static(token.to_string()), timeout)
    }

    fn with_auth(
        base_url: &str,
        spreadsheet_id: &str,
        auth: SheetsAuth,
        timeout: Duration
    ) -> Result<Self, SinkError> {
        Url::parse(base_url)?;
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            auth,
        })
    }

    fn endpoint(&self, tail: &[&str]) -> Result<Url, SinkError> {
        let mut url = Url::parse(&self.base_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SinkError::Config(format!("Cannot use {} as a base url", self.base_url)))?;
            segments.pop_if_empty().push("spreadsheets");
            segments.extend(tail);
        }
        Ok(url)
    }

    fn values_endpoint(&self, range: &str) -> Result<Url, SinkError> {
        self.endpoint(&[self.spreadsheet_id.as_str(), "values", range])
    }

    async fn send(&self, req: RequestBuilder) -> Result<Value, SinkError> {
        let token = self.auth.bearer().await?;
        let resp = req.bearer_auth(token).header(ACCEPT, "application/json").send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SinkError::Status { status, body });
        }
        let body = resp.bytes().await?;
        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn sheet_titles(&self) -> Result<Vec<String>, SinkError> {
        let url = self.endpoint(&[self.spreadsheet_id.as_str()])?;
        let body = self.send(
            self.client.get(url).query(&[("fields", "sheets.properties.title")])
        ).await?;
        let meta: SpreadsheetMeta = serde_json::from_value(body)?;
        Ok(meta.sheets.into_iter().map(|sheet| sheet.properties.title).collect())
    }
}

/// A1 notation for a sheet, quoting the title.
fn a1_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

#[async_trait]
impl TabularSink for GoogleSheetsSink {
    async fn ensure_sheet(&self, sheet: &str) -> Result<(), SinkError> {
        if self.sheet_titles().await?.iter().any(|title| title == sheet) {
            return Ok(());
        }

        info!("Sheet '{}' not found, creating it", sheet);
        let batch_update = format!("{}:batchUpdate", self.spreadsheet_id);
        let url = self.endpoint(&[batch_update.as_str()])?;
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": sheet,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLUMNS
                        }
                    }
                }
            }]
        });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>, SinkError> {
        let url = self.values_endpoint(&a1_range(sheet, &format!("{}:{}", row, row)))?;
        let body = self.send(self.client.get(url)).await?;
        let range: ValueRange = serde_json::from_value(body)?;

        Ok(
            range.values
                .into_iter()
                .next()
                .unwrap_or_default()
                .into_iter()
                .map(|cell| match cell {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect()
        )
    }

    async fn write_row(&self, sheet: &str, row: usize, values: Vec<Value>) -> Result<(), SinkError> {
        let range = a1_range(sheet, &format!("A{}", row));
        let url = self.values_endpoint(&range)?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": [values] });
        self.send(
            self.client.put(url).query(&[("valueInputOption", "RAW")]).json(&body)
        ).await?;
        Ok(())
    }

    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<Value>>) -> Result<(), SinkError> {
        let range = a1_range(sheet, "A1");
        let url = self.values_endpoint(&format!("{}:append", range))?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.send(
            self.client
                .post(url)
                .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                .json(&body)
        ).await?;
        Ok(())
    }
}
