//! Usage reporting shared by the AI stages.

use brain_core::Completion;
use ledger::{Ledger, UsageRecord};
use tracing::debug;

use crate::error::OrchestratorError;

/// Report a completion's tokens: charge the balance, or only log when the company
/// paid with its own key. Returns the credits charged.
pub(crate) async fn report_usage(
    ledger: &Ledger,
    company_id: &str,
    conversation_id: &str,
    completion: &Completion,
    uses_own_key: bool,
) -> Result<Option<i64>, OrchestratorError> {
    let usage = UsageRecord {
        company_id,
        conversation_id: Some(conversation_id),
        model: &completion.model,
        prompt_tokens: i64::from(completion.usage.prompt_tokens),
        completion_tokens: i64::from(completion.usage.completion_tokens),
        total_tokens: i64::from(completion.usage.total_tokens),
    };

    if uses_own_key {
        ledger.log_usage_only(&usage).await?;
        return Ok(None);
    }

    let charge = ledger.deduct(&usage).await?;
    debug!(
        company_id = %company_id,
        cost = charge.cost,
        balance_after = charge.balance_after,
        "Usage billed"
    );
    Ok(Some(charge.cost))
}
