//! Chatbot stage: runs the conversation through its channel's flow.

use async_trait::async_trait;
use channel_dispatch::ChannelDispatcher;
use chatbot_flow::{advance, validate, ChatbotFlow, FlowOutcome};
use database::{chatbot_flow as flow_store, conversation, ConversationStatus, Database};
use tracing::{debug, info, warn};

use crate::error::OrchestratorError;
use crate::settings::BOT_SENDER_NAME;
use crate::stages::ChatbotStage;

/// Loads the active flow and the conversation's position, advances it, sends the
/// reply and stores the new position.
///
/// A conversation without a position enters the flow at the start node and gets the
/// start message.
#[derive(Clone)]
pub struct ChatbotResponder {
    db: Database,
    dispatcher: ChannelDispatcher,
}

impl ChatbotResponder {
    pub fn new(db: Database, dispatcher: ChannelDispatcher) -> Self {
        Self { db, dispatcher }
    }

    async fn reply(
        &self,
        conversation_id: &str,
        company_id: &str,
        text: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        if let Some(text) = text.filter(|t| !t.trim().is_empty()) {
            self.dispatcher
                .send(conversation_id, company_id, text, Some(BOT_SENDER_NAME))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ChatbotStage for ChatbotResponder {
    async fn handle(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<FlowOutcome, OrchestratorError> {
        let pool = self.db.pool();
        let conv = conversation::get_conversation(pool, conversation_id).await?;

        let Some(record) =
            flow_store::active_flow_for_channel(pool, &conv.company_id, &conv.channel_id).await?
        else {
            debug!(conversation_id = %conversation_id, "No chatbot flow configured");
            return Ok(FlowOutcome::unhandled());
        };

        let flow = match ChatbotFlow::from_json(&record.flow_json) {
            Ok(flow) => flow,
            Err(e) => {
                warn!(flow_id = %record.id, "Skipping unreadable chatbot flow: {}", e);
                return Ok(FlowOutcome::unhandled());
            }
        };
        for problem in validate(&flow) {
            warn!(flow_id = %record.id, "Chatbot flow problem: {}", problem);
        }

        // A position removed by a later flow edit restarts the flow.
        let position = match conv.flow_node_id.as_deref() {
            Some(node_id) if flow.node(node_id).is_some() => Some(node_id),
            Some(node_id) => {
                warn!(
                    conversation_id = %conversation_id,
                    flow_id = %record.id,
                    node_id,
                    "Stored flow position no longer exists, restarting flow"
                );
                None
            }
            None => None,
        };

        let Some(current) = position else {
            let Some(start) = flow.start_node() else {
                return Ok(FlowOutcome::unhandled());
            };

            info!(conversation_id = %conversation_id, flow_id = %record.id, "Entering chatbot flow");
            self.reply(conversation_id, &conv.company_id, Some(&start.message))
                .await?;
            conversation::set_flow_node(pool, conversation_id, Some(&flow.start_node_id)).await?;

            return Ok(FlowOutcome {
                handled: true,
                reply: Some(start.message.clone()).filter(|m| !m.trim().is_empty()),
                next_node_id: Some(flow.start_node_id.clone()),
                ..FlowOutcome::default()
            });
        };

        let outcome = advance(&flow, current, text);

        if let Some(next) = outcome.next_node_id.as_deref() {
            self.reply(conversation_id, &conv.company_id, outcome.reply.as_deref())
                .await?;
            conversation::set_flow_node(pool, conversation_id, Some(next)).await?;
        } else if outcome.transfer_to_human {
            conversation::set_flow_node(pool, conversation_id, None).await?;
            conversation::set_status(pool, conversation_id, ConversationStatus::WaitingHuman)
                .await?;
            info!(conversation_id = %conversation_id, "Chatbot handed conversation to a human");
        } else if outcome.ended {
            conversation::set_flow_node(pool, conversation_id, None).await?;
            info!(conversation_id = %conversation_id, "Chatbot flow ended");
        }

        Ok(outcome)
    }
}
