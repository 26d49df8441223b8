//! Message event queue consumer.
//!
//! The chat backend pushes one JSON envelope per created message onto a
//! Redis list; this consumer pops them with `BLPOP` and runs one pipeline
//! invocation per event. Malformed payloads are dropped with a warning.
//! Consumption is at-most-once: a crash mid-invocation loses that event
//! and the next message starts a fresh, independent attempt.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use courier_common::types::MessageCreated;
use courier_pipeline::FanoutPipeline;

/// How long one `BLPOP` waits before re-entering the loop.
const POP_TIMEOUT_SECS: f64 = 5.0;

/// Pause after a Redis error before retrying.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Blocking consumer over the message-created queue.
pub struct QueueConsumer {
    redis: ConnectionManager,
    queue_key: String,
}

impl QueueConsumer {
    pub fn new(redis: ConnectionManager, queue_key: String) -> Self {
        Self { redis, queue_key }
    }

    /// Consume events until the process is terminated.
    pub async fn run(&mut self, pipeline: &FanoutPipeline) -> anyhow::Result<()> {
        tracing::info!(queue = %self.queue_key, "Message queue consumer started");

        loop {
            let popped: Option<(String, String)> =
                match self.redis.blpop(&self.queue_key, POP_TIMEOUT_SECS).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(error = %e, "Queue read failed, backing off");
                        tokio::time::sleep(ERROR_BACKOFF).await;
                        continue;
                    }
                };

            // Timeout with an empty queue; poll again
            let Some((_, payload)) = popped else {
                continue;
            };

            let event: MessageCreated = match serde_json::from_str(&payload) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed message event");
                    continue;
                }
            };

            match pipeline.handle_message(&event).await {
                Ok(outcome) => tracing::info!(
                    message_id = %event.message_id,
                    outcome = %outcome,
                    "Fan-out invocation finished"
                ),
                Err(e) => tracing::error!(
                    message_id = %event.message_id,
                    error = %e,
                    "Fan-out invocation failed"
                ),
            }
        }
    }
}
