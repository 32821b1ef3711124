use chrono::{ DateTime, SecondsFormat, Utc };
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::ChatId;

pub const HEADER: [&str; 5] = [
    "ChatID",
    "ClientName",
    "ClientRespondedToSellerMessage",
    "SellerRespondedToClientFirstMessage",
    "SellerMessageTimestamp",
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRow {
    pub chat_id: ChatId,
    pub client_name: String,
    pub client_responded: bool,
    pub seller_responded_after_client: bool,
    pub seller_message_timestamp: i64,
}

impl OutcomeRow {
    pub fn formatted_timestamp(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.seller_message_timestamp)
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_else(|| self.seller_message_timestamp.to_string())
    }

    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            Value::from(self.chat_id.clone()),
            Value::from(self.client_name.clone()),
            Value::from(self.client_responded),
            Value::from(self.seller_responded_after_client),
            Value::from(self.formatted_timestamp())
        ]
    }

    pub fn to_record(&self) -> [String; 5] {
        [
            self.chat_id.clone(),
            self.client_name.clone(),
            self.client_responded.to_string(),
            self.seller_responded_after_client.to_string(),
            self.formatted_timestamp(),
        ]
    }
}

pub fn header_cells() -> Vec<Value> {
    HEADER.iter().map(|column| Value::from(*column)).collect()
}
