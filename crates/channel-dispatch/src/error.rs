//! Error types for channel-dispatch.

use database::DatabaseError;
use thiserror::Error;

/// Errors that can occur while delivering or recording an outbound message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The messaging provider rejected the request.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// No credentials are available for the channel.
    #[error("missing credentials: {0}")]
    MissingCredentials(String),

    /// Reading or recording the conversation failed.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The conversation does not belong to the calling company.
    #[error("conversation {conversation_id} does not belong to company {company_id}")]
    ConversationMismatch {
        conversation_id: String,
        company_id: String,
    },
}
