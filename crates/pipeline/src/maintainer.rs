//! Token registry maintenance.
//!
//! Any per-token delivery failure is taken as proof the token is stale and
//! its registry record is cleared immediately. Cleanups for different
//! tokens are independent and run concurrently; one failed cleanup never
//! blocks the others.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use courier_common::types::DeliveryResult;

use crate::registry::TokenRegistry;

/// Clear the registry records of every failed token.
///
/// Each failed token is looked up by value and the token field cleared on
/// every matching record. Returns the number of tokens for which at least
/// one record was cleared. Individual lookup or clear failures are logged
/// and skipped.
pub async fn prune_failed_tokens(
    registry: Arc<dyn TokenRegistry>,
    failed: &[DeliveryResult],
) -> u32 {
    let mut join_set = JoinSet::new();

    for result in failed {
        if result.success {
            continue;
        }
        let registry = registry.clone();
        let token = result.token.clone();

        join_set.spawn(async move {
            // Only a prefix of the token is ever logged
            let token_prefix: String = token.chars().take(8).collect();

            let user_ids = match registry.users_holding_token(&token).await {
                Ok(user_ids) => user_ids,
                Err(e) => {
                    warn!(token_prefix, error = %e, "Failed to look up owner of stale token");
                    return false;
                }
            };

            let mut cleared = false;
            for user_id in user_ids {
                match registry.clear_token(&user_id).await {
                    Ok(()) => cleared = true,
                    Err(e) => {
                        warn!(user_id = %user_id, token_prefix, error = %e, "Failed to clear stale token")
                    }
                }
            }
            cleared
        });
    }

    let mut pruned = 0u32;
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok(true) => pruned += 1,
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Token cleanup task failed"),
        }
    }

    pruned
}
