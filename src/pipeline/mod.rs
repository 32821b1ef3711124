pub mod group;
pub mod dialogue;
pub mod relevance;
pub mod outcome;

use std::collections::HashSet;

use crate::models::event::ChatEvent;
use crate::models::outcome::OutcomeRow;
use crate::models::ProductId;
use self::dialogue::build_dialogues;
use self::group::group_by_chat;
use self::outcome::classify;
use self::relevance::{ filter_relevant, ChatProductMap };

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub events: usize,
    pub chats: usize,
    pub dialogues: usize,
    pub relevant: usize,
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct CycleOutput {
    pub rows: Vec<OutcomeRow>,
    pub stats: CycleStats,
}

/// Holds what survives between poll cycles: the chat to product snapshot
/// and the tracked product ids. Everything else is rebuilt per call to `run`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    chat_products: ChatProductMap,
    target_products: HashSet<ProductId>,
}

impl Pipeline {
    pub fn new(chat_products: ChatProductMap, target_products: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            chat_products,
            target_products: target_products.into_iter().collect(),
        }
    }

    pub fn chat_products(&self) -> &ChatProductMap {
        &self.chat_products
    }

    pub fn run(&self, events: Vec<ChatEvent>) -> CycleOutput {
        let event_count = events.len();
        let grouped = group_by_chat(events);
        let dialogues = build_dialogues(&grouped);
        let relevant = filter_relevant(&self.chat_products, &self.target_products);
        let rows = classify(&relevant, &dialogues);

        let stats = CycleStats {
            events: event_count,
            chats: grouped.len(),
            dialogues: dialogues.values().filter(|messages| !messages.is_empty()).count(),
            relevant: relevant.len(),
            rows: rows.len(),
        };
        CycleOutput { rows, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::EventMessage;

    fn event(chat: &str, sender: &str, name: Option<&str>, text: &str, at: i64) -> ChatEvent {
        ChatEvent {
            chat_id: Some(chat.to_string()),
            sender: Some(sender.to_string()),
            client_name: name.map(str::to_string),
            message: Some(EventMessage {
                text: Some(text.to_string()),
                attachments: None,
            }),
            add_timestamp: Some(at),
            ..Default::default()
        }
    }

    fn pipeline() -> Pipeline {
        let links: ChatProductMap = [
            ("C1".to_string(), 1),
            ("C2".to_string(), 2),
        ]
            .into_iter()
            .collect();
        Pipeline::new(links, vec![1])
    }

    #[test]
    fn seller_client_seller_conversation() {
        let events = vec![
            event("C1", "seller", None, "Hi", 100),
            event("C1", "client", Some("Anna"), "Hello", 150),
            event("C1", "seller", None, "Thanks", 200),
            event("C2", "seller", None, "Untracked", 50)
        ];
        let output = pipeline().run(events);
        assert_eq!(output.rows, vec![OutcomeRow {
            chat_id: "C1".to_string(),
            client_name: "Anna".to_string(),
            client_responded: true,
            seller_responded_after_client: true,
            seller_message_timestamp: 100,
        }]);
        assert_eq!(output.stats, CycleStats {
            events: 4,
            chats: 2,
            dialogues: 2,
            relevant: 1,
            rows: 1,
        });
    }

    #[test]
    fn cycles_do_not_share_state() {
        let pipeline = pipeline();
        let first = pipeline.run(vec![event("C1", "seller", None, "Hi", 100)]);
        assert_eq!(first.rows.len(), 1);

        let second = pipeline.run(Vec::new());
        assert!(second.rows.is_empty());
        assert_eq!(second.stats.chats, 0);
        assert_eq!(second.stats.relevant, 1);
        assert_eq!(pipeline.chat_products().len(), 2);
    }
}
