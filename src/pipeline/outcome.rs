use log::info;
use std::collections::BTreeSet;

use super::dialogue::Dialogues;
use crate::models::dialogue::{ DialogueMessage, Role };
use crate::models::outcome::OutcomeRow;
use crate::models::ChatId;

/// Builds one row per relevant chat that has at least one message.
///
/// The first message of a dialogue is taken as the tracked seller message;
/// its sender is not checked. Rows come back ordered by that message's time.
pub fn classify(relevant: &BTreeSet<ChatId>, dialogues: &Dialogues) -> Vec<OutcomeRow> {
    let mut rows: Vec<OutcomeRow> = relevant
        .iter()
        .filter_map(|chat_id| {
            let messages = dialogues.get(chat_id)?;
            classify_dialogue(chat_id, messages)
        })
        .collect();

    rows.sort_by_key(|row| row.seller_message_timestamp);
    info!("Classified {} relevant dialogues.", rows.len());
    rows
}

pub fn classify_dialogue(chat_id: &str, messages: &[DialogueMessage]) -> Option<OutcomeRow> {
    let tracked = messages.first()?;

    let first_reply = messages
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, message)| message.sender == Role::Client);

    let (client_responded, client_name, seller_responded_after_client) = match first_reply {
        Some((index, reply)) => {
            let seller_followed = messages[index + 1..]
                .iter()
                .any(|message| message.sender == Role::Seller);
            (true, reply.name.clone(), seller_followed)
        }
        None => (false, String::new(), false),
    };

    Some(OutcomeRow {
        chat_id: chat_id.to_string(),
        client_name,
        client_responded,
        seller_responded_after_client,
        seller_message_timestamp: tracked.timestamp,
    })
}
