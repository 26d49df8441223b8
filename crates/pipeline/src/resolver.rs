//! Recipient resolution.

use courier_common::error::AppError;

use crate::registry::TokenRegistry;

/// Resolve the recipient token list for a message from `sender_id`.
///
/// Takes every registered token and drops the sender's own record,
/// matched by user id. A sender with no registered token is simply absent
/// from the base query. Registry failure halts the pipeline before any
/// dispatch is attempted; an empty result is a clean outcome, not an error.
pub async fn resolve(
    registry: &dyn TokenRegistry,
    sender_id: &str,
) -> Result<Vec<String>, AppError> {
    let owners = registry.users_with_tokens().await?;

    let tokens: Vec<String> = owners
        .into_iter()
        .filter(|owner| owner.user_id != sender_id)
        .map(|owner| owner.token)
        .collect();

    tracing::debug!(recipients = tokens.len(), "Resolved recipient tokens");
    Ok(tokens)
}
