//! Fan-out pipeline orchestration.
//!
//! Runs the full invocation for one message-created event:
//! validate, resolve recipients, dispatch batches, reconcile results,
//! prune failed tokens. Only a validation skip or a registry failure
//! during resolution ends the invocation early; every later failure is
//! folded into the aggregate outcome.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use courier_common::error::AppError;
use courier_common::types::{FanoutOutcome, MessageCreated};
use courier_gateway::PushGateway;

use crate::dispatcher::BatchDispatcher;
use crate::registry::TokenRegistry;
use crate::{maintainer, reconciler, resolver, trigger};

/// Errors that terminate a fan-out invocation.
#[derive(Debug, Error)]
pub enum FanoutError {
    /// Registry read failure during recipient lookup. Nothing was
    /// dispatched; redelivery, if any, is the queue's concern.
    #[error("Recipient resolution failed: {0}")]
    Resolution(#[source] AppError),
}

/// The fan-out pipeline, constructed once at process start and shared
/// across invocations. Holds no per-invocation state.
pub struct FanoutPipeline {
    registry: Arc<dyn TokenRegistry>,
    dispatcher: BatchDispatcher,
}

impl FanoutPipeline {
    pub fn new(
        registry: Arc<dyn TokenRegistry>,
        gateway: Arc<dyn PushGateway>,
        dispatch_concurrency: usize,
        dispatch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            dispatcher: BatchDispatcher::new(gateway, dispatch_concurrency, dispatch_timeout),
        }
    }

    /// Handle one message-created event to completion.
    pub async fn handle_message(
        &self,
        event: &MessageCreated,
    ) -> Result<FanoutOutcome, FanoutError> {
        let Some(message) = trigger::validate(event) else {
            return Ok(FanoutOutcome::Skipped);
        };

        let tokens = resolver::resolve(self.registry.as_ref(), &message.sender_id)
            .await
            .map_err(FanoutError::Resolution)?;

        if tokens.is_empty() {
            tracing::info!(
                message_id = %message.message_id,
                "No recipients registered, nothing to dispatch"
            );
            return Ok(FanoutOutcome::NoRecipients);
        }

        let recipients = tokens.len();
        let outcomes = self.dispatcher.dispatch(tokens, &message).await;
        let reconciliation = reconciler::reconcile(outcomes);

        let failed: Vec<_> = reconciliation
            .results
            .iter()
            .filter(|result| !result.success)
            .cloned()
            .collect();

        let pruned = if failed.is_empty() {
            0
        } else {
            maintainer::prune_failed_tokens(self.registry.clone(), &failed).await
        };

        tracing::info!(
            message_id = %message.message_id,
            recipients,
            delivered = reconciliation.counts.delivered,
            failed = reconciliation.counts.failed,
            pruned,
            "Fan-out completed"
        );

        Ok(FanoutOutcome::Completed(reconciliation.counts))
    }
}
