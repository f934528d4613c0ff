//! Conversation analyzer: the pipeline's terminal, best-effort stage.

use async_trait::async_trait;
use brain_core::{ChatMessage, CompletionRequest};
use database::{company, conversation, insight, message, ConversationInsight, Database, InsightValues, Message};
use ledger::Ledger;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::billing::report_usage;
use crate::error::OrchestratorError;
use crate::provider::ProviderResolver;
use crate::stages::AnalyzerStage;

/// Messages included in the transcript.
pub const TRANSCRIPT_LIMIT: i64 = 50;

/// Topics kept per insight.
pub const MAX_TOPICS: usize = 5;

const ANALYSIS_TEMPERATURE: f32 = 0.3;

const ANALYSIS_PROMPT: &str = r#"Analiza la siguiente conversación de atención al cliente.
Responde solo con un objeto JSON con estas claves:
- "toneScore": número de 1 a 100 (qué tan cordial y profesional fue el agente)
- "clarityScore": número de 1 a 100 (qué tan claras fueron las respuestas)
- "summary": resumen breve de la conversación
- "sentiment": "positive", "neutral" o "negative" (sentimiento del cliente)
- "topics": lista de hasta 5 temas
- "urgency": "low", "medium" o "high""#;

/// Structured analysis as returned by the model.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    #[serde(default)]
    tone_score: f64,
    #[serde(default)]
    clarity_score: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    urgency: Option<String>,
}

/// Stored `flags_json` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightFlags {
    pub sentiment: String,
    pub topics: Vec<String>,
    pub urgency: String,
}

/// Summarizes a conversation into its single live insight.
#[derive(Clone)]
pub struct ConversationAnalyzer {
    db: Database,
    ledger: Ledger,
    providers: ProviderResolver,
}

impl ConversationAnalyzer {
    pub fn new(db: Database, ledger: Ledger, providers: ProviderResolver) -> Self {
        Self {
            db,
            ledger,
            providers,
        }
    }

    async fn try_analyze(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationInsight>, OrchestratorError> {
        let pool = self.db.pool();
        let conv = conversation::get_conversation(pool, conversation_id).await?;

        let messages = message::list_recent_messages(pool, conversation_id, TRANSCRIPT_LIMIT).await?;
        if messages.is_empty() {
            debug!(conversation_id = %conversation_id, "Nothing to analyze");
            return Ok(None);
        }

        let check = self.ledger.check_balance(&conv.company_id).await?;
        if !check.has_credits {
            debug!(company_id = %conv.company_id, "No credits left, analysis skipped");
            return Ok(None);
        }

        let company = company::get_company(pool, &conv.company_id).await?;
        let provider = match self.providers.resolve(&company) {
            Ok(provider) => provider,
            Err(e) => {
                warn!(company_id = %company.id, "No model provider available: {}", e);
                return Ok(None);
            }
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(ANALYSIS_PROMPT),
            ChatMessage::user(transcript(&messages)),
        ])
        .with_temperature(ANALYSIS_TEMPERATURE)
        .json();

        let completion = match provider.brain.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(conversation_id = %conversation_id, "Analysis completion failed: {}", e);
                return Ok(None);
            }
        };

        report_usage(
            &self.ledger,
            &conv.company_id,
            conversation_id,
            &completion,
            provider.uses_own_key,
        )
        .await?;

        let analysis: AnalysisResponse = match serde_json::from_str(&completion.content) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(conversation_id = %conversation_id, "Unreadable analysis: {}", e);
                return Ok(None);
            }
        };

        let flags = InsightFlags {
            sentiment: analysis.sentiment.unwrap_or_else(|| "neutral".to_string()),
            topics: analysis.topics.into_iter().take(MAX_TOPICS).collect(),
            urgency: analysis.urgency.unwrap_or_else(|| "low".to_string()),
        };
        let flags_json = serde_json::to_string(&flags)
            .map_err(|e| OrchestratorError::InvalidResponse(e.to_string()))?;

        let stored = insight::upsert_insight(
            pool,
            &InsightValues {
                company_id: &conv.company_id,
                conversation_id,
                tone_score: clamp_score(analysis.tone_score),
                clarity_score: clamp_score(analysis.clarity_score),
                summary: analysis.summary.trim(),
                flags_json: &flags_json,
            },
        )
        .await?;

        debug!(conversation_id = %conversation_id, insight_id = stored.id, "Insight updated");
        Ok(Some(stored))
    }
}

#[async_trait]
impl AnalyzerStage for ConversationAnalyzer {
    async fn analyze(&self, conversation_id: &str) -> Option<ConversationInsight> {
        match self.try_analyze(conversation_id).await {
            Ok(insight) => insight,
            Err(e @ OrchestratorError::Ledger(_)) => {
                error!(conversation_id = %conversation_id, "Analysis billing failed: {}", e);
                None
            }
            Err(e) => {
                warn!(conversation_id = %conversation_id, "Analysis failed: {}", e);
                None
            }
        }
    }
}

/// Role-tagged transcript, one line per message.
fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let speaker = if m.is_inbound() { "Cliente" } else { "Agente" };
            format!("{}: {}", speaker, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Round into [1, 100].
fn clamp_score(value: f64) -> i64 {
    if value.is_nan() {
        return 1;
    }
    value.round().clamp(1.0, 100.0) as i64
}
