//! Outbound delivery plus conversation history bookkeeping.

use std::sync::Arc;

use database::{channel, conversation, message, ChannelType, Database, MessageDirection};
use tracing::{info, warn};

use crate::client::MessagingClient;
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::types::{channel_credentials, DeliveryTarget, DispatchOutcome};

/// Sends replies on a conversation's channel and records them.
///
/// A message is recorded whenever delivery was attempted, even if the provider failed,
/// so the history reflects what the system tried to say. Instagram channels without a
/// token are skipped entirely.
#[derive(Clone)]
pub struct ChannelDispatcher {
    db: Database,
    client: Arc<dyn MessagingClient>,
    config: DispatchConfig,
}

impl ChannelDispatcher {
    pub fn new(db: Database, client: Arc<dyn MessagingClient>, config: DispatchConfig) -> Self {
        Self { db, client, config }
    }

    /// Send `content` to the customer of `conversation_id`.
    ///
    /// Errors only for lookup or recording failures; provider failures come back as
    /// [`DispatchOutcome::Failed`].
    pub async fn send(
        &self,
        conversation_id: &str,
        company_id: &str,
        content: &str,
        from_name: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let pool = self.db.pool();

        let conversation = conversation::get_conversation(pool, conversation_id).await?;
        if conversation.company_id != company_id {
            return Err(DispatchError::ConversationMismatch {
                conversation_id: conversation_id.to_string(),
                company_id: company_id.to_string(),
            });
        }

        let channel = channel::get_channel(pool, &conversation.channel_id).await?;
        let contact = conversation::get_contact(pool, &conversation.contact_id).await?;

        let target = match (channel.kind(), channel_credentials(&channel)) {
            (_, Some(target)) => Ok(target),
            (Some(ChannelType::WhatsApp), None) => self
                .config
                .platform_whatsapp
                .clone()
                .map(DeliveryTarget::WhatsApp)
                .ok_or_else(|| {
                    DispatchError::MissingCredentials(format!(
                        "no WhatsApp sender for channel {}",
                        channel.id
                    ))
                }),
            (Some(ChannelType::Instagram), None) => {
                warn!(
                    channel_id = %channel.id,
                    conversation_id = %conversation_id,
                    "Instagram channel has no access token, message not sent"
                );
                return Ok(DispatchOutcome::Skipped {
                    reason: "instagram access token missing".to_string(),
                });
            }
            (None, None) => Err(DispatchError::MissingCredentials(format!(
                "unsupported channel type {}",
                channel.channel_type
            ))),
        };

        let delivery = match target {
            Ok(target) => self
                .client
                .send_text(&target, &contact.external_id, content)
                .await
                .map(|_| ()),
            Err(err) => Err(err),
        };

        let message_id = message::insert_message(
            pool,
            conversation_id,
            MessageDirection::Outbound,
            content,
            from_name,
        )
        .await?;
        conversation::touch_outbound(pool, conversation_id).await?;

        match delivery {
            Ok(()) => {
                info!(
                    conversation_id = %conversation_id,
                    channel = %channel.channel_type,
                    "Message delivered"
                );
                Ok(DispatchOutcome::Delivered { message_id })
            }
            Err(err) => {
                warn!(
                    conversation_id = %conversation_id,
                    channel = %channel.channel_type,
                    "Delivery failed, message recorded anyway: {}",
                    err
                );
                Ok(DispatchOutcome::Failed {
                    message_id,
                    reason: err.to_string(),
                })
            }
        }
    }
}
