use log::{ debug, info };
use std::collections::BTreeMap;

use super::group::GroupedEvents;
use crate::models::dialogue::{ DialogueMessage, Role };
use crate::models::event::ChatEvent;
use crate::models::ChatId;

pub const ATTACHMENT_MARKER: &str = "[Attachment]";

pub type Dialogues = BTreeMap<ChatId, Vec<DialogueMessage>>;

pub fn build_dialogues(grouped: &GroupedEvents) -> Dialogues {
    let dialogues: Dialogues = grouped
        .iter()
        .map(|(chat_id, events)| (chat_id.clone(), build_dialogue(events)))
        .collect();
    info!("Processed {} chats into dialogues.", dialogues.len());
    dialogues
}

/// Normalizes one chat's events into messages ordered by time.
/// Equal timestamps keep their arrival order.
pub fn build_dialogue(events: &[ChatEvent]) -> Vec<DialogueMessage> {
    let mut messages: Vec<DialogueMessage> = events.iter().filter_map(to_message).collect();
    messages.sort_by_key(|message| message.timestamp);
    messages
}

fn to_message(event: &ChatEvent) -> Option<DialogueMessage> {
    let payload = event.message.as_ref()?;
    let sender = Role::from_sender(event.sender.as_deref());

    let text = match payload.text.as_deref() {
        Some(text) if !text.is_empty() => text.to_string(),
        _ if payload.has_attachments() => ATTACHMENT_MARKER.to_string(),
        _ => {
            return None;
        }
    };

    let Some(timestamp) = event.timestamp() else {
        debug!("Skipping event {:?} without a timestamp", event.event_id);
        return None;
    };

    let name = match (&sender, event.client_name.as_deref()) {
        (Role::Client, Some(client_name)) if !client_name.is_empty() => client_name.to_string(),
        _ => sender.display_name(),
    };

    Some(DialogueMessage { sender, name, text, timestamp })
}
