use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::{ SinkError, TabularSink };

/// In-process sink, used for dry runs.
#[derive(Default)]
pub struct MemorySink {
    sheets: Mutex<BTreeMap<String, Vec<Vec<Value>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self, sheet: &str) -> Vec<Vec<Value>> {
        self.sheets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(sheet)
            .cloned()
            .unwrap_or_default()
    }

    fn with_sheet<T>(
        &self,
        sheet: &str,
        f: impl FnOnce(&mut Vec<Vec<Value>>) -> T
    ) -> Result<T, SinkError> {
        let mut sheets = self.sheets.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let rows = sheets.get_mut(sheet).ok_or_else(|| SinkError::MissingSheet(sheet.to_string()))?;
        Ok(f(rows))
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TabularSink for MemorySink {
    async fn ensure_sheet(&self, sheet: &str) -> Result<(), SinkError> {
        self.sheets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(sheet.to_string())
            .or_default();
        Ok(())
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>, SinkError> {
        self.with_sheet(sheet, |rows| {
            row.checked_sub(1)
                .and_then(|index| rows.get(index))
                .map(|cells| cells.iter().map(cell_text).collect())
                .unwrap_or_default()
        })
    }

    async fn write_row(&self, sheet: &str, row: usize, values: Vec<Value>) -> Result<(), SinkError> {
        let index = row
            .checked_sub(1)
            .ok_or_else(|| SinkError::Config("rows are numbered from 1".to_string()))?;
        self.with_sheet(sheet, |rows| {
            if rows.len() <= index {
                rows.resize(index + 1, Vec::new());
            }
            rows[index] = values;
        })
    }

    async fn append_rows(&self, sheet: &str, new_rows: Vec<Vec<Value>>) -> Result<(), SinkError> {
        self.with_sheet(sheet, |rows| rows.extend(new_rows))
    }
}
