//! Prepaid credit ledger and AI usage pricing.
//!
//! - [`PriceTable`] / [`cost`] turn token consumption into credits
//! - [`Ledger`] checks, charges and tops up a company's balance, recording every
//!   balance-affecting event with the balance it produced
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, TransactionKind};
//! use ledger::{Ledger, UsageRecord};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:varylo.db?mode=rwc").await?;
//! let ledger = Ledger::new(db);
//!
//! ledger
//!     .add("acme", 20_000, TransactionKind::Recharge, "Recarga", Some("pay-123"))
//!     .await?;
//!
//! if ledger.check_balance("acme").await?.has_credits {
//!     ledger
//!         .deduct(&UsageRecord {
//!             company_id: "acme",
//!             conversation_id: None,
//!             model: "gpt-4o-mini",
//!             prompt_tokens: 900,
//!             completion_tokens: 120,
//!             total_tokens: 1_020,
//!         })
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod ledger;
pub mod pricing;

pub use error::{LedgerError, Result};
pub use ledger::{AddResult, BalanceCheck, Charge, Ledger, UsageRecord};
pub use pricing::{cost, ModelPrice, PriceTable};
