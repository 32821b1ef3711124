pub mod wb;

use async_trait::async_trait;
use log::{ error, info, warn };
use std::time::Duration;
use thiserror::Error;

use crate::models::event::{ ChatEvent, ChatSummary, EventsPage };
use crate::models::Cursor;
use crate::pipeline::relevance::ChatProductMap;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("page with {0} events carried no cursor")]
    MissingCursor(usize),
    #[error("cursor {0} did not advance")]
    StalledCursor(Cursor),
}

/// Read side of the buyer-chat API.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_chats(&self) -> Result<Vec<ChatSummary>, SourceError>;

    async fn fetch_events_page(&self, cursor: Cursor) -> Result<EventsPage, SourceError>;
}

/// Events collected by one pagination pass. `interrupted` holds the error
/// that cut the pass short, if any; events fetched before it are kept.
#[derive(Debug, Default)]
pub struct EventFetch {
    pub events: Vec<ChatEvent>,
    pub pages: usize,
    pub interrupted: Option<SourceError>,
}

pub fn link_chats_to_products(chats: &[ChatSummary]) -> ChatProductMap {
    let mut links = ChatProductMap::new();
    for chat in chats {
        if let (Some(chat_id), Some(product_id)) = (&chat.chat_id, chat.product_id()) {
            links.entry(chat_id.clone()).or_insert(product_id);
        }
    }
    links
}

pub async fn fetch_chat_product_links(
    source: &dyn EventSource
) -> Result<ChatProductMap, SourceError> {
    let chats = source.fetch_chats().await?;
    Ok(link_chats_to_products(&chats))
}

/// Snapshot of chat to product links; a failed fetch is logged and yields
/// an empty map.
pub async fn load_chat_product_links(source: &dyn EventSource) -> ChatProductMap {
    info!("Fetching chats to link chat IDs with nmIDs...");
    match fetch_chat_product_links(source).await {
        Ok(links) => {
            info!("Found {} chat-nmID links", links.len());
            links
        }
        Err(e) => {
            error!("Error fetching chats: {}", e);
            ChatProductMap::new()
        }
    }
}

/// Walks the events feed from the beginning, pausing `page_delay` before
/// every request, until a page reports no events.
pub async fn fetch_all_events(source: &dyn EventSource, page_delay: Duration) -> EventFetch {
    info!("Starting events fetching...");
    let mut fetch = EventFetch::default();
    let mut cursor: Cursor = 0;

    loop {
        tokio::time::sleep(page_delay).await;

        let page = match source.fetch_events_page(cursor).await {
            Ok(page) => page,
            Err(e) => {
                error!("Error fetching events page at cursor {}: {}", cursor, e);
                fetch.interrupted = Some(e);
                break;
            }
        };
        fetch.pages += 1;

        if page.total_events == 0 {
            info!("No more events to fetch. Stopping.");
            break;
        }

        let received = page.events.len();
        fetch.events.extend(page.events);
        info!(
            "Fetched {} events. Total events collected: {}. Cursor: {:?}",
            received,
            fetch.events.len(),
            page.next
        );

        match page.next {
            Some(next) if next != cursor => {
                cursor = next;
            }
            Some(next) => {
                warn!("Events cursor stuck at {}, stopping pagination", next);
                fetch.interrupted = Some(SourceError::StalledCursor(next));
                break;
            }
            None => {
                warn!("Events page without cursor, stopping pagination");
                fetch.interrupted = Some(SourceError::MissingCursor(received));
                break;
            }
        }
    }

    info!("Finished events fetching. Total events collected: {}.", fetch.events.len());
    fetch
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned pages and records the cursors it was asked for.
    struct ScriptedSource {
        chats: Vec<ChatSummary>,
        pages: Mutex<VecDeque<Result<EventsPage, SourceError>>>,
        cursors: Mutex<Vec<Cursor>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<EventsPage, SourceError>>) -> Self {
            Self {
                chats: Vec::new(),
                pages: Mutex::new(pages.into_iter().collect()),
                cursors: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EventSource for ScriptedSource {
        async fn fetch_chats(&self) -> Result<Vec<ChatSummary>, SourceError> {
            Ok(self.chats.clone())
        }

        async fn fetch_events_page(&self, cursor: Cursor) -> Result<EventsPage, SourceError> {
            self.cursors.lock().unwrap().push(cursor);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(EventsPage::default()))
        }
    }

    fn page(next: Option<Cursor>, ids: &[&str]) -> Result<EventsPage, SourceError> {
        Ok(EventsPage {
            next,
            total_events: ids.len(),
            events: ids
                .iter()
                .map(|id| ChatEvent {
                    event_id: Some(id.to_string()),
                    ..Default::default()
                })
                .collect(),
        })
    }

    fn chat(chat_id: Option<&str>, product: Option<i64>) -> ChatSummary {
        ChatSummary {
            chat_id: chat_id.map(str::to_string),
            good_card: product.map(|nm_id| crate::models::event::GoodCard { nm_id: Some(nm_id) }),
        }
    }

    #[test]
    fn first_product_link_wins() {
        let links = link_chats_to_products(
            &[
                chat(Some("a"), Some(1)),
                chat(Some("a"), Some(2)),
                chat(Some("b"), None),
                chat(None, Some(3)),
            ]
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links["a"], 1);
    }

    #[tokio::test]
    async fn pagination_follows_cursor_until_empty_page() {
        let source = ScriptedSource::new(
            vec![page(Some(10), &["1", "2"]), page(Some(20), &["3"]), page(None, &[])]
        );
        let fetch = fetch_all_events(&source, Duration::ZERO).await;

        assert_eq!(fetch.events.len(), 3);
        assert_eq!(fetch.pages, 3);
        assert!(fetch.interrupted.is_none());
        assert_eq!(*source.cursors.lock().unwrap(), vec![0, 10, 20]);
    }

    #[tokio::test]
    async fn failure_keeps_partial_events() {
        let failure: Result<EventsPage, SourceError> = Err(
            SourceError::Decode(serde_json::from_str::<EventsPage>("not json").unwrap_err())
        );
        let source = ScriptedSource::new(vec![page(Some(10), &["1", "2"]), failure]);
        let fetch = fetch_all_events(&source, Duration::ZERO).await;

        assert_eq!(fetch.events.len(), 2);
        assert!(matches!(fetch.interrupted, Some(SourceError::Decode(_))));
    }

    #[tokio::test]
    async fn stalled_cursor_ends_pagination() {
        let source = ScriptedSource::new(vec![page(Some(10), &["1"]), page(Some(10), &["2"])]);
        let fetch = fetch_all_events(&source, Duration::ZERO).await;

        assert_eq!(fetch.events.len(), 2);
        assert!(matches!(fetch.interrupted, Some(SourceError::StalledCursor(10))));
    }

    #[tokio::test(start_paused = true)]
    async fn pauses_before_every_page() {
        let source = ScriptedSource::new(vec![page(Some(10), &["1"]), page(None, &[])]);
        let started = tokio::time::Instant::now();
        fetch_all_events(&source, Duration::from_secs(2)).await;
        assert!(started.elapsed() >= Duration::from_secs(4));
    }
}
