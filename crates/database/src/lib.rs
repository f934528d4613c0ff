//! SQLite persistence layer for Varylo.
//!
//! This crate provides async database operations for companies, channels,
//! conversations, messages, the credit ledger, AI usage logs, chatbot flows and
//! conversation insights using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{company, credit, Database, TransactionKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:varylo.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Create a company and fund it
//!     company::create_company(db.pool(), "acme", "Acme", 0).await?;
//!     credit::apply_credit(db.pool(), "acme", 5000, TransactionKind::Recharge, "Recarga", None)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod chatbot_flow;
pub mod company;
pub mod conversation;
pub mod credit;
pub mod error;
pub mod insight;
pub mod message;
pub mod models;

pub use credit::{CreditOutcome, NewUsageLog};
pub use error::{DatabaseError, Result};
pub use insight::InsightValues;
pub use models::{
    AiUsageLog, AutomationPriority, Channel, ChannelType, ChatbotFlowRecord, Company, Contact,
    Conversation, ConversationInsight, ConversationStatus, CreditTransaction, Message,
    MessageDirection, TransactionKind,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Set high enough to handle concurrent message processing and webhook deliveries.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/varylo.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Open a private, migrated in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is pinned to
    /// a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
