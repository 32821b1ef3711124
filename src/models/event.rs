use chrono::DateTime;
use serde::{ Deserialize, Serialize };
use serde_json::Value;

use super::{ ChatId, Cursor, ProductId };

/// Envelope shared by every buyer-chat API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub result: T,
    #[serde(default)]
    pub errors: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoodCard {
    #[serde(rename = "nmID", default)]
    pub nm_id: Option<ProductId>,
}

/// One entry of the chats listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSummary {
    #[serde(rename = "chatID", default)]
    pub chat_id: Option<ChatId>,
    #[serde(rename = "goodCard", default)]
    pub good_card: Option<GoodCard>,
}

impl ChatSummary {
    pub fn product_id(&self) -> Option<ProductId> {
        self.good_card.as_ref().and_then(|card| card.nm_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Option<Value>,
}

impl EventMessage {
    pub fn has_attachments(&self) -> bool {
        self.attachments.as_ref().map(is_present).unwrap_or(false)
    }
}

// null, empty strings and empty containers count as "nothing attached"
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(_) => true,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "chatID", default)]
    pub chat_id: Option<ChatId>,
    #[serde(rename = "eventID", default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(rename = "clientName", default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(rename = "addTimestamp", default)]
    pub add_timestamp: Option<i64>,
    #[serde(rename = "addTime", default)]
    pub add_time: Option<String>,
}

impl ChatEvent {
    /// Event time in milliseconds since the epoch.
    pub fn timestamp(&self) -> Option<i64> {
        self.add_timestamp.or_else(|| {
            self.add_time
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|parsed| parsed.timestamp_millis())
        })
    }
}

/// One page of the events feed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventsPage {
    #[serde(default)]
    pub next: Option<Cursor>,
    #[serde(rename = "totalEvents", default)]
    pub total_events: usize,
    #[serde(default)]
    pub events: Vec<ChatEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_events_page() {
        let body = json!({
            "result": {
                "next": 1700000000123i64,
                "newestEventTime": "2024-01-01T10:00:00Z",
                "totalEvents": 1,
                "events": [{
                    "chatID": "1:abc",
                    "eventID": "e1",
                    "eventType": "message",
                    "sender": "client",
                    "clientName": "Anna",
                    "addTimestamp": 1700000000000i64,
                    "message": { "text": "Hello", "attachments": null }
                }]
            },
            "errors": null
        });
        let page: ApiResponse<EventsPage> = serde_json::from_value(body).unwrap();
        assert_eq!(page.result.next, Some(1700000000123));
        assert_eq!(page.result.total_events, 1);
        let event = &page.result.events[0];
        assert_eq!(event.chat_id.as_deref(), Some("1:abc"));
        assert_eq!(event.timestamp(), Some(1700000000000));
        assert!(!event.message.as_ref().unwrap().has_attachments());
    }

    #[test]
    fn timestamp_falls_back_to_add_time() {
        let event = ChatEvent {
            add_time: Some("1970-01-01T00:00:01.500Z".to_string()),
            ..Default::default()
        };
        assert_eq!(event.timestamp(), Some(1500));
        assert_eq!(ChatEvent::default().timestamp(), None);
    }

    #[test]
    fn attachment_presence() {
        let with_images = EventMessage {
            text: None,
            attachments: Some(json!({ "images": [{ "url": "x" }] })),
        };
        let empty = EventMessage {
            text: None,
            attachments: Some(json!({})),
        };
        assert!(with_images.has_attachments());
        assert!(!empty.has_attachments());
        assert!(!EventMessage::default().has_attachments());
    }

    #[test]
    fn chat_without_card_has_no_product() {
        let chat: ChatSummary = serde_json::from_value(json!({ "chatID": "c1" })).unwrap();
        assert_eq!(chat.product_id(), None);
        let chat: ChatSummary = serde_json
            ::from_value(json!({ "chatID": "c2", "goodCard": { "nmID": 42, "price": 100 } }))
            .unwrap();
        assert_eq!(chat.product_id(), Some(42));
    }
}
