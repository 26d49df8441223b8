//! In-memory collaborator fakes shared across pipeline tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use courier_common::error::AppError;
use courier_common::types::{TokenOwner, ValidMessage};
use courier_gateway::payload::{ErrorDetail, TokenStatus};
use courier_gateway::{GatewayError, NotificationMessage, PushGateway};

use crate::registry::TokenRegistry;

pub(crate) fn make_valid_message(sender_name: &str, text: &str) -> ValidMessage {
    ValidMessage {
        message_id: "msg-1".to_string(),
        text: text.to_string(),
        sender_id: "sender".to_string(),
        sender_name: sender_name.to_string(),
    }
}

pub(crate) fn numbered_tokens(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("tok-{i:03}")).collect()
}

/// In-memory token registry with the same ordering contract as the
/// Postgres implementation.
pub(crate) struct FakeRegistry {
    rows: Mutex<Vec<(String, Option<String>)>>,
    fail_reads: bool,
    failing_clears: HashSet<String>,
}

impl FakeRegistry {
    pub(crate) fn with_tokens(pairs: &[(&str, &str)]) -> Self {
        Self {
            rows: Mutex::new(
                pairs
                    .iter()
                    .map(|(user_id, token)| (user_id.to_string(), Some(token.to_string())))
                    .collect(),
            ),
            fail_reads: false,
            failing_clears: HashSet::new(),
        }
    }

    /// Every read fails, simulating a registry outage.
    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Clearing this user's token fails, simulating a write error.
    pub(crate) fn failing_clears_for(mut self, user_id: &str) -> Self {
        self.failing_clears.insert(user_id.to_string());
        self
    }

    pub(crate) fn token_of(&self, user_id: &str) -> Option<String> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|(user, _)| user == user_id)
            .and_then(|(_, token)| token.clone())
    }
}

#[async_trait]
impl TokenRegistry for FakeRegistry {
    async fn users_with_tokens(&self) -> Result<Vec<TokenOwner>, AppError> {
        if self.fail_reads {
            return Err(AppError::Config("registry unavailable".to_string()));
        }
        let mut owners: Vec<TokenOwner> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(user_id, token)| {
                token.clone().map(|token| TokenOwner {
                    user_id: user_id.clone(),
                    token,
                })
            })
            .collect();
        owners.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(owners)
    }

    async fn users_holding_token(&self, token: &str) -> Result<Vec<String>, AppError> {
        if self.fail_reads {
            return Err(AppError::Config("registry unavailable".to_string()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, held)| held.as_deref() == Some(token))
            .map(|(user_id, _)| user_id.clone())
            .collect())
    }

    async fn clear_token(&self, user_id: &str) -> Result<(), AppError> {
        if self.failing_clears.contains(user_id) {
            return Err(AppError::Config("clear rejected".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|(user, _)| user == user_id) {
            row.1 = None;
        }
        Ok(())
    }
}

/// Scriptable push gateway that records every batch it is handed.
pub(crate) struct FakeGateway {
    calls: Mutex<Vec<Vec<String>>>,
    failing_tokens: HashSet<String>,
    error_batches_containing: HashSet<String>,
}

impl FakeGateway {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_tokens: HashSet::new(),
            error_batches_containing: HashSet::new(),
        }
    }

    /// This token gets a per-token failure inside a successful batch.
    pub(crate) fn with_failing_token(mut self, token: &str) -> Self {
        self.failing_tokens.insert(token.to_string());
        self
    }

    /// Any batch carrying this token errors wholesale.
    pub(crate) fn with_error_batch_containing(mut self, token: &str) -> Self {
        self.error_batches_containing.insert(token.to_string());
        self
    }

    pub(crate) fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for FakeGateway {
    async fn send_multicast(
        &self,
        tokens: Vec<String>,
        _message: &NotificationMessage,
    ) -> Result<Vec<TokenStatus>, GatewayError> {
        self.calls.lock().unwrap().push(tokens.clone());

        if tokens
            .iter()
            .any(|token| self.error_batches_containing.contains(token))
        {
            return Err(GatewayError::Status {
                status: 503,
                body: "batch rejected".to_string(),
            });
        }

        Ok(tokens
            .iter()
            .map(|token| {
                if self.failing_tokens.contains(token) {
                    TokenStatus {
                        success: false,
                        error: Some(ErrorDetail {
                            message: "unregistered".to_string(),
                        }),
                    }
                } else {
                    TokenStatus {
                        success: true,
                        error: None,
                    }
                }
            })
            .collect())
    }
}
