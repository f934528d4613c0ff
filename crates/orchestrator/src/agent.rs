//! AI agent stage: answers with the model provider when credits allow.

use async_trait::async_trait;
use brain_core::{ChatMessage, CompletionRequest};
use channel_dispatch::ChannelDispatcher;
use database::{channel, company, conversation, message, Database, Message};
use ledger::Ledger;
use tracing::{debug, info, warn};

use crate::billing::report_usage;
use crate::error::OrchestratorError;
use crate::provider::ProviderResolver;
use crate::settings::{AgentSettings, AI_SENDER_NAME};
use crate::stages::{AgentOutcome, AgentStage};

/// Messages of context sent with each request.
pub const HISTORY_LIMIT: i64 = 20;

/// LLM responder with credit gating.
///
/// Provider failures degrade to [`AgentOutcome::ProviderUnavailable`]. Errors are
/// only returned for storage and ledger failures.
#[derive(Clone)]
pub struct AiAgent {
    db: Database,
    ledger: Ledger,
    providers: ProviderResolver,
    dispatcher: ChannelDispatcher,
}

impl AiAgent {
    pub fn new(
        db: Database,
        ledger: Ledger,
        providers: ProviderResolver,
        dispatcher: ChannelDispatcher,
    ) -> Self {
        Self {
            db,
            ledger,
            providers,
            dispatcher,
        }
    }
}

#[async_trait]
impl AgentStage for AiAgent {
    async fn respond(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<AgentOutcome, OrchestratorError> {
        let pool = self.db.pool();
        let conv = conversation::get_conversation(pool, conversation_id).await?;
        let channel = channel::get_channel(pool, &conv.channel_id).await?;

        let settings = AgentSettings::for_channel(&channel);
        if !settings.enabled {
            debug!(channel_id = %channel.id, "AI agent disabled for channel");
            return Ok(AgentOutcome::Disabled);
        }

        let check = self.ledger.check_balance(&conv.company_id).await?;
        if !check.has_credits {
            info!(
                company_id = %conv.company_id,
                balance = check.balance,
                "No credits left, AI agent skipped"
            );
            return Ok(AgentOutcome::NoCredits);
        }

        let company = company::get_company(pool, &conv.company_id).await?;
        let provider = match self.providers.resolve(&company) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(company_id = %company.id, "No model provider available: {}", e);
                return Ok(AgentOutcome::ProviderUnavailable);
            }
        };

        let history = message::list_recent_messages(pool, conversation_id, HISTORY_LIMIT).await?;
        let mut request =
            CompletionRequest::new(build_messages(settings.system_prompt(), &history, text));
        if let Some(model) = settings.model.as_deref() {
            request = request.with_model(model);
        }

        let completion = match provider.brain.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    provider = provider.brain.name(),
                    "AI agent completion failed: {}",
                    e
                );
                return Ok(AgentOutcome::ProviderUnavailable);
            }
        };

        // Tokens are spent once the provider answers, whatever happens to the reply.
        let cost = report_usage(
            &self.ledger,
            &conv.company_id,
            conversation_id,
            &completion,
            provider.uses_own_key,
        )
        .await?;

        let reply = completion.content.trim();
        if reply.is_empty() {
            warn!(conversation_id = %conversation_id, "AI agent returned an empty reply");
            return Ok(AgentOutcome::ProviderUnavailable);
        }

        self.dispatcher
            .send(conversation_id, &conv.company_id, reply, Some(AI_SENDER_NAME))
            .await?;

        info!(conversation_id = %conversation_id, ?cost, "AI agent replied");
        Ok(AgentOutcome::Replied { cost })
    }
}

/// System prompt, then the history as user/assistant turns, ending with the
/// inbound text unless the history already ends with it.
fn build_messages(system_prompt: &str, history: &[Message], text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));

    messages.extend(history.iter().map(|m| {
        if m.is_inbound() {
            ChatMessage::user(&m.content)
        } else {
            ChatMessage::assistant(&m.content)
        }
    }));

    let already_last = history
        .last()
        .is_some_and(|m| m.is_inbound() && m.content == text);
    if !already_last {
        messages.push(ChatMessage::user(text));
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(direction: &str, content: &str) -> Message {
        Message {
            id: 0,
            conversation_id: "c".to_string(),
            direction: direction.to_string(),
            content: content.to_string(),
            sender_name: None,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_build_messages_roles() {
        let history = vec![
            msg("INBOUND", "Hola"),
            msg("OUTBOUND", "¿En qué te ayudo?"),
            msg("INBOUND", "Precio"),
        ];

        let messages = build_messages("sys", &history, "Precio");
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[3].content, "Precio");
    }

    #[test]
    fn test_build_messages_appends_missing_inbound() {
        let messages = build_messages("sys", &[msg("OUTBOUND", "Hola")], "¿Horario?");
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages[2].content, "¿Horario?");
    }
}
