//! Inbound customer messages.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{channel, conversation, message, ConversationStatus, MessageDirection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// A message received from a channel provider.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    /// Platform identifier of the sender.
    pub from: String,
    /// Sender display name, if the provider knows it.
    #[serde(default)]
    pub name: Option<String>,
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundAccepted {
    pub conversation_id: String,
    /// Whether the automation pipeline was started.
    pub automation: bool,
}

/// Record an inbound message and start automation in the background.
pub async fn receive_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(req): Json<InboundMessage>,
) -> Result<(StatusCode, Json<InboundAccepted>)> {
    let from = req.from.trim();
    let text = req.text.trim();
    if from.is_empty() {
        return Err(ServerError::BadRequest("from is required".to_string()));
    }
    if text.is_empty() {
        return Err(ServerError::BadRequest("text is required".to_string()));
    }

    let pool = state.db.pool();
    let channel = channel::get_channel(pool, &channel_id).await?;

    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let contact = conversation::upsert_contact(pool, &channel.company_id, from, name).await?;
    let (conv, created) =
        conversation::find_or_create_conversation(pool, &channel.company_id, &channel.id, &contact.id)
            .await?;

    message::insert_message(pool, &conv.id, MessageDirection::Inbound, text, name).await?;
    conversation::touch_inbound(pool, &conv.id).await?;

    info!(
        conversation_id = %conv.id,
        channel_id = %channel.id,
        new_conversation = created,
        "Inbound message stored"
    );

    let with_human = conv.status == ConversationStatus::WaitingHuman.as_str()
        || conv.assigned_agent_id.is_some();

    if with_human {
        debug!(conversation_id = %conv.id, "Conversation is with a human, automation skipped");
    } else {
        state
            .pipeline
            .spawn(conv.id.clone(), text.to_string(), channel.priority());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(InboundAccepted {
            conversation_id: conv.id,
            automation: !with_human,
        }),
    ))
}
