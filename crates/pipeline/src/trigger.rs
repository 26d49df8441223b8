//! Message event trigger validation.
//!
//! Incomplete payloads are an expected, frequent case (system messages,
//! drafts flushed by the client). They skip the fan-out with an info log
//! rather than raising an error.

use courier_common::types::{MessageCreated, ValidMessage};

/// Validate a message-created event.
///
/// Returns `None` when the message lacks text or a sender, in which case
/// no notification work happens for this event. An empty sender *name* is
/// allowed; the dispatcher substitutes a generic label in the title.
pub fn validate(event: &MessageCreated) -> Option<ValidMessage> {
    let text = match event.text.as_deref() {
        Some(text) if !text.is_empty() => text,
        _ => {
            tracing::info!(message_id = %event.message_id, "Skipping notification: message has no text");
            return None;
        }
    };

    let sender = match event.user.as_ref() {
        Some(sender) if !sender.uid.is_empty() => sender,
        _ => {
            tracing::info!(message_id = %event.message_id, "Skipping notification: message has no sender");
            return None;
        }
    };

    Some(ValidMessage {
        message_id: event.message_id.clone(),
        text: text.to_string(),
        sender_id: sender.uid.clone(),
        sender_name: sender.name.clone(),
    })
}
