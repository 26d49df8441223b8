use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue envelope emitted by the chat backend when a message is created.
///
/// All content fields are optional: incomplete payloads are an expected,
/// frequent case and are handled by trigger validation rather than by
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreated {
    /// Identifier of the message record that triggered this event.
    pub message_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub user: Option<MessageSender>,
    #[serde(default)]
    pub company_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// The user who posted the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSender {
    pub uid: String,
    /// Display name. May be empty; the notification title falls back to a
    /// generic label in that case.
    #[serde(default)]
    pub name: String,
}

/// A message that passed trigger validation and will drive a fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMessage {
    pub message_id: String,
    pub text: String,
    pub sender_id: String,
    pub sender_name: String,
}

/// A row in the device token registry. One record per user; `token` is
/// cleared (never the row deleted) when delivery confirms it stale.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceTokenRecord {
    pub user_id: String,
    pub token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Registry projection for recipient resolution: a user together with
/// their current (non-null) device token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenOwner {
    pub user_id: String,
    pub token: String,
}

/// Per-token delivery outcome for one fan-out invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub token: String,
    pub success: bool,
    pub error_reason: Option<String>,
}

/// Aggregate delivery counts for one fan-out invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCounts {
    pub delivered: u32,
    pub failed: u32,
}

/// Terminal state of one fan-out invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanoutOutcome {
    /// The message payload was incomplete; nothing was dispatched.
    Skipped,
    /// No registered recipient tokens existed besides the sender's.
    NoRecipients,
    /// Dispatch ran to completion with the given aggregate counts.
    Completed(DeliveryCounts),
}

impl std::fmt::Display for FanoutOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FanoutOutcome::Skipped => write!(f, "skipped"),
            FanoutOutcome::NoRecipients => write!(f, "no_recipients"),
            FanoutOutcome::Completed(_) => write!(f, "completed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_created_full_payload() {
        let event: MessageCreated = serde_json::from_str(
            r#"{
                "messageId": "msg-1",
                "text": "hello",
                "user": {"uid": "u1", "name": "Ann"},
                "companyId": "co-9",
                "createdAt": "2024-03-01T12:00:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(event.message_id, "msg-1");
        assert_eq!(event.text.as_deref(), Some("hello"));
        assert_eq!(event.user.as_ref().unwrap().uid, "u1");
        assert_eq!(event.company_id.as_deref(), Some("co-9"));
    }

    #[test]
    fn test_message_created_missing_fields_default_to_none() {
        let event: MessageCreated = serde_json::from_str(r#"{"messageId": "msg-2"}"#).unwrap();

        assert!(event.text.is_none());
        assert!(event.user.is_none());
        assert!(event.company_id.is_none());
        assert!(event.created_at.is_none());
    }

    #[test]
    fn test_sender_name_defaults_to_empty() {
        let sender: MessageSender = serde_json::from_str(r#"{"uid": "u1"}"#).unwrap();
        assert_eq!(sender.name, "");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(FanoutOutcome::Skipped.to_string(), "skipped");
        assert_eq!(FanoutOutcome::NoRecipients.to_string(), "no_recipients");
        assert_eq!(
            FanoutOutcome::Completed(DeliveryCounts::default()).to_string(),
            "completed"
        );
    }
}
