use log::{ info, warn };
use std::collections::BTreeMap;

use crate::models::event::ChatEvent;
use crate::models::ChatId;

pub type GroupedEvents = BTreeMap<ChatId, Vec<ChatEvent>>;

/// Buckets events by chat id keeping arrival order inside each chat.
/// Events without a chat id cannot belong to any dialogue and are dropped.
pub fn group_by_chat(events: Vec<ChatEvent>) -> GroupedEvents {
    let total = events.len();
    let mut grouped: GroupedEvents = BTreeMap::new();
    let mut orphaned = 0usize;

    for event in events {
        match event.chat_id.clone() {
            Some(chat_id) => grouped.entry(chat_id).or_default().push(event),
            None => {
                orphaned += 1;
            }
        }
    }

    if orphaned > 0 {
        warn!("Dropped {} events without a chatID", orphaned);
    }
    info!("Grouped {} events into {} unique chat IDs.", total, grouped.len());
    grouped
}
