//! The credit ledger over the persistence layer.

use database::{company, credit, CreditOutcome, CreditTransaction, Database, NewUsageLog, TransactionKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{LedgerError, Result};
use crate::pricing::PriceTable;

/// Answer to "may this company spend model tokens right now?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheck {
    /// True when the company pays its own provider or has a positive balance.
    pub has_credits: bool,
    /// Whether the company supplied its own provider key.
    pub uses_own_key: bool,
    /// Current balance.
    pub balance: i64,
}

/// Outcome of [`Ledger::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResult {
    /// Always true when `add` returns `Ok`; idempotent replays are successes too.
    pub success: bool,
    /// Balance after the call.
    pub new_balance: i64,
    /// False when the reference was already recorded and nothing changed.
    pub applied: bool,
}

/// Tokens consumed by one completion, attributed to a company.
#[derive(Debug, Clone, Copy)]
pub struct UsageRecord<'a> {
    pub company_id: &'a str,
    pub conversation_id: Option<&'a str>,
    pub model: &'a str,
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

impl<'a> UsageRecord<'a> {
    fn as_log(&self) -> NewUsageLog<'a> {
        NewUsageLog {
            company_id: self.company_id,
            conversation_id: self.conversation_id,
            model: self.model,
            prompt_tokens: self.prompt_tokens,
            completion_tokens: self.completion_tokens,
            total_tokens: self.total_tokens,
        }
    }
}

/// A billed completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    /// Credits charged.
    pub cost: i64,
    /// Balance right after the charge (may be negative).
    pub balance_after: i64,
}

/// A company's prepaid balance and its transaction log.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Ledger {
    db: Database,
    prices: PriceTable,
}

impl Ledger {
    /// Create a ledger with the built-in price list.
    pub fn new(db: Database) -> Self {
        Self::with_prices(db, PriceTable::default())
    }

    /// Create a ledger with a custom price list.
    pub fn with_prices(db: Database, prices: PriceTable) -> Self {
        Self { db, prices }
    }

    /// The price list used for charges.
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Read-only credit check.
    pub async fn check_balance(&self, company_id: &str) -> Result<BalanceCheck> {
        let company = company::find_company(self.db.pool(), company_id)
            .await?
            .ok_or_else(|| LedgerError::CompanyNotFound(company_id.to_string()))?;

        let uses_own_key = company.uses_own_key();
        Ok(BalanceCheck {
            has_credits: uses_own_key || company.credit_balance > 0,
            uses_own_key,
            balance: company.credit_balance,
        })
    }

    /// Charge the priced cost of a completion against the company's balance.
    ///
    /// The decrement, the `AI_USAGE` transaction and the usage log commit together.
    pub async fn deduct(&self, usage: &UsageRecord<'_>) -> Result<Charge> {
        let cost = self
            .prices
            .cost(usage.model, usage.prompt_tokens, usage.completion_tokens);
        let description = format!(
            "Uso IA ({}): {} tokens",
            usage.model, usage.total_tokens
        );

        let tx = credit::charge_usage(self.db.pool(), &usage.as_log(), cost, &description).await?;

        debug!(
            company_id = %usage.company_id,
            cost,
            balance_after = tx.balance_after,
            "Charged AI usage"
        );

        Ok(Charge {
            cost,
            balance_after: tx.balance_after,
        })
    }

    /// Add credits (or remove them, for manual adjustments).
    ///
    /// With a `reference_id` already on record this is a successful no-op returning the
    /// current balance.
    pub async fn add(
        &self,
        company_id: &str,
        amount: i64,
        kind: TransactionKind,
        description: &str,
        reference_id: Option<&str>,
    ) -> Result<AddResult> {
        validate_amount(amount, kind)?;

        let outcome = credit::apply_credit(
            self.db.pool(),
            company_id,
            amount,
            kind,
            description,
            reference_id,
        )
        .await?;

        let applied = matches!(outcome, CreditOutcome::Applied(_));
        if applied {
            info!(
                company_id = %company_id,
                amount,
                kind = kind.as_str(),
                new_balance = outcome.balance(),
                "Credits applied"
            );
        }

        Ok(AddResult {
            success: true,
            new_balance: outcome.balance(),
            applied,
        })
    }

    /// Record usage paid with the company's own key. The balance is untouched.
    ///
    /// The priced cost is still logged so reports show what the platform would have billed.
    pub async fn log_usage_only(&self, usage: &UsageRecord<'_>) -> Result<()> {
        let cost = self
            .prices
            .cost(usage.model, usage.prompt_tokens, usage.completion_tokens);
        credit::insert_usage_log(self.db.pool(), &usage.as_log(), cost, true).await?;

        debug!(company_id = %usage.company_id, "Logged own-key usage");
        Ok(())
    }

    /// Most recent transactions of a company, newest first.
    pub async fn history(&self, company_id: &str, limit: i64) -> Result<Vec<CreditTransaction>> {
        Ok(credit::list_transactions(self.db.pool(), company_id, limit).await?)
    }
}

fn validate_amount(amount: i64, kind: TransactionKind) -> Result<()> {
    match kind {
        _ if amount == 0 => Err(LedgerError::InvalidAmount(
            "amount must not be zero".to_string(),
        )),
        TransactionKind::AiUsage => Err(LedgerError::InvalidAmount(
            "AI usage is charged through deduct".to_string(),
        )),
        TransactionKind::Recharge | TransactionKind::Refund if amount < 0 => Err(
            LedgerError::InvalidAmount(format!("{} must be positive", kind.as_str())),
        ),
        _ => Ok(()),
    }
}
