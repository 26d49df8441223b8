//! Batch dispatcher.
//!
//! Builds the shared notification payload once per invocation, partitions
//! the recipient tokens into gateway-sized batches, and dispatches each
//! batch through a bounded worker pool. Batches are independent units of
//! work: a failed or timed-out batch is captured as that batch's outcome
//! and never aborts the others.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use courier_common::types::ValidMessage;
use courier_gateway::{
    GatewayError, MAX_MULTICAST_TOKENS, NotificationMessage, PushGateway, TokenStatus,
};

/// Maximum characters of message text carried in the notification body.
const MAX_BODY_CHARS: usize = 100;

/// Title fallback when the sender has no display name.
const FALLBACK_SENDER_NAME: &str = "Team Member";

/// Result of one dispatched batch: the tokens it carried and either the
/// gateway's per-token statuses or the batch-level error.
#[derive(Debug)]
pub struct BatchOutcome {
    pub tokens: Vec<String>,
    pub response: Result<Vec<TokenStatus>, GatewayError>,
}

/// Dispatches notification batches through the push gateway.
pub struct BatchDispatcher {
    gateway: Arc<dyn PushGateway>,
    concurrency: usize,
    timeout: Duration,
}

impl BatchDispatcher {
    pub fn new(gateway: Arc<dyn PushGateway>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            gateway,
            // A bound of zero would dispatch nothing
            concurrency: concurrency.max(1),
            timeout,
        }
    }

    /// Build the notification content shared by every batch of this
    /// invocation.
    ///
    /// The body carries at most [`MAX_BODY_CHARS`] characters of message
    /// text, with a `...` marker when truncated.
    pub fn build_message(message: &ValidMessage) -> NotificationMessage {
        let sender = if message.sender_name.is_empty() {
            FALLBACK_SENDER_NAME
        } else {
            &message.sender_name
        };

        let body = if message.text.chars().count() > MAX_BODY_CHARS {
            let truncated: String = message.text.chars().take(MAX_BODY_CHARS).collect();
            format!("{truncated}...")
        } else {
            message.text.clone()
        };

        NotificationMessage {
            title: format!("New message from {sender}"),
            body,
            message_id: message.message_id.clone(),
        }
    }

    /// Dispatch all batches for one invocation and return their outcomes
    /// in batch order.
    ///
    /// Tokens are partitioned into consecutive chunks of at most
    /// [`MAX_MULTICAST_TOKENS`], so each token belongs to exactly one
    /// batch. Up to `concurrency` batch requests are in flight at once;
    /// each is bounded by the configured timeout.
    pub async fn dispatch(&self, tokens: Vec<String>, message: &ValidMessage) -> Vec<BatchOutcome> {
        if tokens.is_empty() {
            return Vec::new();
        }

        let payload = Arc::new(Self::build_message(message));
        let batches: Vec<Vec<String>> = tokens
            .chunks(MAX_MULTICAST_TOKENS)
            .map(|chunk| chunk.to_vec())
            .collect();

        debug!(
            message_id = %message.message_id,
            recipients = tokens.len(),
            batches = batches.len(),
            "Dispatching notification batches"
        );

        let mut slots: Vec<Option<BatchOutcome>> =
            std::iter::repeat_with(|| None).take(batches.len()).collect();
        let mut pending = batches.into_iter().enumerate();
        let mut join_set = JoinSet::new();

        // Prime the pool, then refill one task per completion
        for _ in 0..self.concurrency {
            match pending.next() {
                Some((index, batch)) => self.spawn_batch(&mut join_set, index, batch, &payload),
                None => break,
            }
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Err(ref e) = outcome.response {
                        warn!(
                            batch = index,
                            tokens = outcome.tokens.len(),
                            error = %e,
                            "Batch dispatch failed"
                        );
                    }
                    slots[index] = Some(outcome);
                }
                Err(e) => error!(error = %e, "Batch dispatch task failed"),
            }

            if let Some((index, batch)) = pending.next() {
                self.spawn_batch(&mut join_set, index, batch, &payload);
            }
        }

        slots.into_iter().flatten().collect()
    }

    fn spawn_batch(
        &self,
        join_set: &mut JoinSet<(usize, BatchOutcome)>,
        index: usize,
        batch: Vec<String>,
        payload: &Arc<NotificationMessage>,
    ) {
        let gateway = self.gateway.clone();
        let payload = payload.clone();
        let timeout = self.timeout;

        join_set.spawn(async move {
            let sent = batch.clone();
            let response =
                match tokio::time::timeout(timeout, gateway.send_multicast(batch, &payload)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout(timeout)),
                };

            (
                index,
                BatchOutcome {
                    tokens: sent,
                    response,
                },
            )
        });
    }
}
