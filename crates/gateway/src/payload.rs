//! Wire types for the multicast send endpoint.

use serde::{Deserialize, Serialize};

/// Protocol-imposed upper bound on tokens per multicast request.
pub const MAX_MULTICAST_TOKENS: usize = 500;

/// Content-type tag attached to every chat notification.
const DATA_KIND_CHAT: &str = "chat";

/// Click action routing the recipient into the chat screen.
const CLICK_ACTION_OPEN_CHAT: &str = "OPEN_CHAT";

/// The notification content shared by every batch of one fan-out
/// invocation. Built once by the dispatcher, independent of batching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    /// Reference id of the triggering chat message.
    pub message_id: String,
}

/// One multicast delivery request.
#[derive(Debug, Clone, Serialize)]
pub struct MulticastRequest {
    pub tokens: Vec<String>,
    pub notification: Notification,
    pub data: MessageData,
    pub android: AndroidHints,
    pub apns: ApnsHints,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    #[serde(rename = "type")]
    pub kind: String,
    pub message_id: String,
    pub click_action: String,
}

/// Android delivery hints: wake the app and play the default sound.
#[derive(Debug, Clone, Serialize)]
pub struct AndroidHints {
    pub priority: String,
    pub sound: String,
}

/// APNs delivery hints: deliver even when the app is backgrounded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApnsHints {
    pub content_available: bool,
    pub sound: String,
    pub priority: String,
}

impl MulticastRequest {
    /// Assemble the request for one batch of tokens.
    pub fn new(tokens: Vec<String>, message: &NotificationMessage) -> Self {
        Self {
            tokens,
            notification: Notification {
                title: message.title.clone(),
                body: message.body.clone(),
            },
            data: MessageData {
                kind: DATA_KIND_CHAT.to_string(),
                message_id: message.message_id.clone(),
                click_action: CLICK_ACTION_OPEN_CHAT.to_string(),
            },
            android: AndroidHints {
                priority: "high".to_string(),
                sound: "default".to_string(),
            },
            apns: ApnsHints {
                content_available: true,
                sound: "default".to_string(),
                priority: "high".to_string(),
            },
        }
    }
}

/// One multicast delivery response.
#[derive(Debug, Clone, Deserialize)]
pub struct MulticastResponse {
    pub results: Vec<TokenStatus>,
}

/// Delivery outcome for a single token, aligned positionally with the
/// request's token list.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenStatus {
    pub success: bool,
    #[serde(default)]
    pub error: Option<ErrorDetail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}
