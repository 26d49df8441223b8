//! Response reconciliation.
//!
//! Folds per-batch gateway responses into a flat list of per-token
//! delivery results plus aggregate counts. Failures are data here, never
//! errors: a batch-level failure simply marks every token it carried.

use courier_common::types::{DeliveryCounts, DeliveryResult};

use crate::dispatcher::BatchOutcome;

/// Reason recorded when a structured response covers fewer tokens than
/// the batch sent.
const MISSING_RESULT_REASON: &str = "missing result";

/// Flattened delivery results for one invocation.
#[derive(Debug)]
pub struct Reconciliation {
    pub results: Vec<DeliveryResult>,
    pub counts: DeliveryCounts,
}

/// Classify every token of every batch as delivered or failed.
///
/// Structured responses map to tokens positionally; a batch-level error
/// fails the whole batch with the error's message as the reason.
pub fn reconcile(outcomes: Vec<BatchOutcome>) -> Reconciliation {
    let mut results = Vec::new();
    let mut counts = DeliveryCounts::default();

    for outcome in outcomes {
        match outcome.response {
            Ok(statuses) => {
                let mut statuses = statuses.into_iter();
                for token in outcome.tokens {
                    match statuses.next() {
                        Some(status) if status.success => {
                            counts.delivered += 1;
                            results.push(DeliveryResult {
                                token,
                                success: true,
                                error_reason: None,
                            });
                        }
                        Some(status) => {
                            counts.failed += 1;
                            let reason = status
                                .error
                                .map(|e| e.message)
                                .unwrap_or_else(|| "delivery failed".to_string());
                            results.push(DeliveryResult {
                                token,
                                success: false,
                                error_reason: Some(reason),
                            });
                        }
                        None => {
                            counts.failed += 1;
                            results.push(DeliveryResult {
                                token,
                                success: false,
                                error_reason: Some(MISSING_RESULT_REASON.to_string()),
                            });
                        }
                    }
                }
            }
            Err(e) => {
                let reason = e.to_string();
                for token in outcome.tokens {
                    counts.failed += 1;
                    results.push(DeliveryResult {
                        token,
                        success: false,
                        error_reason: Some(reason.clone()),
                    });
                }
            }
        }
    }

    Reconciliation { results, counts }
}
