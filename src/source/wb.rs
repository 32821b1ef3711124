use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::header::{ ACCEPT, AUTHORIZATION };
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{ EventSource, SourceError };
use crate::cli::Args;
use crate::models::event::{ ApiResponse, ChatSummary, EventsPage };
use crate::models::Cursor;

/// Wildberries buyer-chat API client.
pub struct WbEventSource {
    client: reqwest::Client,
    token: String,
    chats_url: String,
    events_url: String,
}

impl WbEventSource {
    pub fn new(
        token: String,
        chats_url: String,
        events_url: String,
        timeout: Duration
    ) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            token,
            chats_url,
            events_url,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, SourceError> {
        Self::new(
            args.wb_token.clone(),
            args.chats_url.clone(),
            args.events_url.clone(),
            Duration::from_secs(args.http_timeout_secs)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)]
    ) -> Result<T, SourceError> {
        debug!("GET {} {:?}", url, query);
        let resp = self.client
            .get(url)
            .header(AUTHORIZATION, &self.token)
            .header(ACCEPT, "application/json")
            .query(query)
            .send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Status { status, body });
        }

        let body = resp.bytes().await?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&body)?;
        if let Some(errors) = envelope.errors.as_ref().filter(|errors| !errors.is_null()) {
            warn!("{} reported errors: {}", url, errors);
        }
        Ok(envelope.result)
    }
}

#[async_trait]
impl EventSource for WbEventSource {
    async fn fetch_chats(&self) -> Result<Vec<ChatSummary>, SourceError> {
        self.get_json(&self.chats_url, &[]).await
    }

    async fn fetch_events_page(&self, cursor: Cursor) -> Result<EventsPage, SourceError> {
        self.get_json(&self.events_url, &[("next", cursor.to_string())]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ fetch_all_events, load_chat_product_links };
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn source(server: &MockServer) -> WbEventSource {
        WbEventSource::new(
            "test-token".to_string(),
            server.url("/api/v1/seller/chats"),
            server.url("/api/v1/seller/events"),
            Duration::from_secs(5)
        ).unwrap()
    }

    #[tokio::test]
    async fn chats_are_linked_to_products() {
        let server = MockServer::start_async().await;
        let mock = server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/chats").header("authorization", "test-token");
            then.status(200).json_body(
                json!({
                    "result": [
                        { "chatID": "c1", "goodCard": { "nmID": 111 } },
                        { "chatID": "c2" },
                        { "chatID": "c1", "goodCard": { "nmID": 222 } }
                    ],
                    "errors": null
                })
            );
        }).await;

        let links = load_chat_product_links(&source(&server)).await;
        mock.assert_async().await;
        assert_eq!(links.len(), 1);
        assert_eq!(links["c1"], 111);
    }

    #[tokio::test]
    async fn failed_chats_request_yields_empty_map() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/chats");
            then.status(401).body("unauthorized");
        }).await;

        let src = source(&server);
        let err = src.fetch_chats().await.unwrap_err();
        assert!(matches!(err, SourceError::Status { status, .. } if status.as_u16() == 401));
        assert!(load_chat_product_links(&src).await.is_empty());
    }

    #[tokio::test]
    async fn events_are_paged_by_cursor() {
        let server = MockServer::start_async().await;
        let first = server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/events").query_param("next", "0");
            then.status(200).json_body(
                json!({
                    "result": {
                        "next": 1700000000500i64,
                        "totalEvents": 2,
                        "events": [
                            { "chatID": "c1", "sender": "seller", "addTimestamp": 1, "message": { "text": "Hi" } },
                            { "chatID": "c1", "sender": "client", "addTimestamp": 2, "message": { "text": "Yo" } }
                        ]
                    }
                })
            );
        }).await;
        let last = server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/events").query_param("next", "1700000000500");
            then.status(200).json_body(json!({ "result": { "totalEvents": 0, "events": [] } }));
        }).await;

        let fetch = fetch_all_events(&source(&server), Duration::ZERO).await;
        first.assert_async().await;
        last.assert_async().await;
        assert_eq!(fetch.events.len(), 2);
        assert!(fetch.interrupted.is_none());
    }

    #[tokio::test]
    async fn server_error_stops_pagination_with_partial_events() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/events").query_param("next", "0");
            then.status(200).json_body(
                json!({
                    "result": {
                        "next": 5,
                        "totalEvents": 1,
                        "events": [{ "chatID": "c1", "addTimestamp": 1, "message": { "text": "Hi" } }]
                    }
                })
            );
        }).await;
        server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/events").query_param("next", "5");
            then.status(500);
        }).await;

        let fetch = fetch_all_events(&source(&server), Duration::ZERO).await;
        assert_eq!(fetch.events.len(), 1);
        assert!(matches!(fetch.interrupted, Some(SourceError::Status { .. })));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server.mock_async(|when, then| {
            when.method(GET).path("/api/v1/seller/events");
            then.status(200).body("<html>maintenance</html>");
        }).await;

        let err = source(&server).fetch_events_page(0).await.unwrap_err();
        assert!(matches!(err, SourceError::Decode(_)));
    }
}
