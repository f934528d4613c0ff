//! The automation pipeline: chatbot, AI agent and analyzer in priority order.

use std::sync::Arc;

use channel_dispatch::ChannelDispatcher;
use chatbot_flow::FlowOutcome;
use database::{AutomationPriority, Database};
use ledger::Ledger;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::agent::AiAgent;
use crate::analyzer::ConversationAnalyzer;
use crate::chatbot::ChatbotResponder;
use crate::error::OrchestratorError;
use crate::provider::ProviderResolver;
use crate::stages::{AgentStage, AnalyzerStage, ChatbotStage};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Chatbot,
    Agent,
    Analyzer,
}

/// What one pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    /// Stages invoked, in order.
    pub stages: Vec<Stage>,
    /// The stage that ended the run.
    pub final_stage: Stage,
}

/// Sequences the stages for one inbound message.
///
/// ```text
/// CHATBOT_FIRST:  Chatbot ──handled──▶ stop
///                    │ unhandled / transfer to AI
///                    ▼
///                 AI agent ──handled──▶ stop
///                    ▼
///                 Analyzer
///
/// AI_FIRST:       AI agent ──handled──▶ stop
///                    ▼
///                 Chatbot ──handled──▶ stop
///                    │ unhandled / transfer to AI
///                    ▼
///                 Analyzer
/// ```
///
/// Stage errors are logged and count as "not handled"; `run` never fails.
#[derive(Clone)]
pub struct Pipeline {
    chatbot: Arc<dyn ChatbotStage>,
    agent: Arc<dyn AgentStage>,
    analyzer: Arc<dyn AnalyzerStage>,
}

impl Pipeline {
    pub fn new(
        chatbot: Arc<dyn ChatbotStage>,
        agent: Arc<dyn AgentStage>,
        analyzer: Arc<dyn AnalyzerStage>,
    ) -> Self {
        Self {
            chatbot,
            agent,
            analyzer,
        }
    }

    /// Wire the database-backed stages.
    pub fn standard(
        db: Database,
        ledger: Ledger,
        dispatcher: ChannelDispatcher,
        providers: ProviderResolver,
    ) -> Self {
        let chatbot = ChatbotResponder::new(db.clone(), dispatcher.clone());
        let agent = AiAgent::new(db.clone(), ledger.clone(), providers.clone(), dispatcher);
        let analyzer = ConversationAnalyzer::new(db, ledger, providers);

        Self::new(Arc::new(chatbot), Arc::new(agent), Arc::new(analyzer))
    }

    /// Process one inbound message.
    pub async fn run(
        &self,
        conversation_id: &str,
        text: &str,
        priority: AutomationPriority,
    ) -> PipelineReport {
        let mut stages = Vec::with_capacity(3);

        let final_stage = match priority {
            AutomationPriority::ChatbotFirst => {
                stages.push(Stage::Chatbot);
                let flow = self.chatbot_step(conversation_id, text).await;

                if flow.handled && !flow.transfer_to_ai {
                    Stage::Chatbot
                } else {
                    stages.push(Stage::Agent);
                    if self.agent_step(conversation_id, text).await {
                        Stage::Agent
                    } else {
                        stages.push(Stage::Analyzer);
                        self.analyzer.analyze(conversation_id).await;
                        Stage::Analyzer
                    }
                }
            }
            AutomationPriority::AiFirst => {
                stages.push(Stage::Agent);
                if self.agent_step(conversation_id, text).await {
                    Stage::Agent
                } else {
                    stages.push(Stage::Chatbot);
                    let flow = self.chatbot_step(conversation_id, text).await;

                    if flow.handled && !flow.transfer_to_ai {
                        Stage::Chatbot
                    } else {
                        if flow.transfer_to_ai {
                            debug!(
                                conversation_id = %conversation_id,
                                "Flow asked for the AI agent, already tried"
                            );
                        }
                        stages.push(Stage::Analyzer);
                        self.analyzer.analyze(conversation_id).await;
                        Stage::Analyzer
                    }
                }
            }
        };

        info!(
            conversation_id = %conversation_id,
            priority = priority.as_str(),
            ?final_stage,
            "Automation finished"
        );

        PipelineReport {
            stages,
            final_stage,
        }
    }

    /// Run in the background; the caller does not wait for replies.
    pub fn spawn(
        &self,
        conversation_id: String,
        text: String,
        priority: AutomationPriority,
    ) -> JoinHandle<PipelineReport> {
        let pipeline = self.clone();
        tokio::spawn(async move { pipeline.run(&conversation_id, &text, priority).await })
    }

    async fn chatbot_step(&self, conversation_id: &str, text: &str) -> FlowOutcome {
        match self.chatbot.handle(conversation_id, text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log_stage_error(Stage::Chatbot, conversation_id, &e);
                FlowOutcome::unhandled()
            }
        }
    }

    async fn agent_step(&self, conversation_id: &str, text: &str) -> bool {
        match self.agent.respond(conversation_id, text).await {
            Ok(outcome) => {
                debug!(conversation_id = %conversation_id, ?outcome, "AI agent outcome");
                outcome.handled()
            }
            Err(e) => {
                log_stage_error(Stage::Agent, conversation_id, &e);
                false
            }
        }
    }
}

fn log_stage_error(stage: Stage, conversation_id: &str, err: &OrchestratorError) {
    match err {
        OrchestratorError::Ledger(_) => {
            error!(conversation_id = %conversation_id, ?stage, "Ledger failure: {}", err)
        }
        _ => warn!(conversation_id = %conversation_id, ?stage, "Stage failed: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::AgentOutcome;
    use async_trait::async_trait;
    use database::ConversationInsight;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedChatbot {
        outcome: Option<FlowOutcome>,
        calls: AtomicUsize,
    }

    impl FixedChatbot {
        fn returning(outcome: FlowOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome: Some(outcome),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                outcome: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChatbotStage for FixedChatbot {
        async fn handle(&self, _: &str, _: &str) -> Result<FlowOutcome, OrchestratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome
                .clone()
                .ok_or_else(|| OrchestratorError::InvalidResponse("boom".to_string()))
        }
    }

    struct FixedAgent {
        outcome: AgentOutcome,
        calls: AtomicUsize,
    }

    impl FixedAgent {
        fn returning(outcome: AgentOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AgentStage for FixedAgent {
        async fn respond(&self, _: &str, _: &str) -> Result<AgentOutcome, OrchestratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.outcome)
        }
    }

    #[derive(Default)]
    struct CountingAnalyzer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalyzerStage for CountingAnalyzer {
        async fn analyze(&self, _: &str) -> Option<ConversationInsight> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    fn handled() -> FlowOutcome {
        FlowOutcome {
            handled: true,
            reply: Some("Hola".to_string()),
            next_node_id: Some("start".to_string()),
            ..FlowOutcome::default()
        }
    }

    fn transfer_to_ai() -> FlowOutcome {
        FlowOutcome {
            transfer_to_ai: true,
            ..FlowOutcome::default()
        }
    }

    const REPLIED: AgentOutcome = AgentOutcome::Replied { cost: Some(3) };

    struct Harness {
        chatbot: Arc<FixedChatbot>,
        agent: Arc<FixedAgent>,
        analyzer: Arc<CountingAnalyzer>,
        pipeline: Pipeline,
    }

    fn harness(chatbot: Arc<FixedChatbot>, agent: AgentOutcome) -> Harness {
        let agent = FixedAgent::returning(agent);
        let analyzer = Arc::new(CountingAnalyzer::default());
        let pipeline = Pipeline::new(chatbot.clone(), agent.clone(), analyzer.clone());
        Harness {
            chatbot,
            agent,
            analyzer,
            pipeline,
        }
    }

    impl Harness {
        fn calls(&self) -> (usize, usize, usize) {
            (
                self.chatbot.calls.load(Ordering::SeqCst),
                self.agent.calls.load(Ordering::SeqCst),
                self.analyzer.calls.load(Ordering::SeqCst),
            )
        }
    }

    #[tokio::test]
    async fn test_chatbot_first_handled_stops() {
        let h = harness(FixedChatbot::returning(handled()), REPLIED);

        let report = h.pipeline.run("c", "hola", AutomationPriority::ChatbotFirst).await;
        assert_eq!(report.final_stage, Stage::Chatbot);
        assert_eq!(h.calls(), (1, 0, 0));
    }

    #[tokio::test]
    async fn test_chatbot_first_transfer_then_agent_fails_runs_analyzer_once() {
        let h = harness(
            FixedChatbot::returning(transfer_to_ai()),
            AgentOutcome::ProviderUnavailable,
        );

        let report = h.pipeline.run("c", "hola", AutomationPriority::ChatbotFirst).await;
        assert_eq!(report.stages, vec![Stage::Chatbot, Stage::Agent, Stage::Analyzer]);
        assert_eq!(h.calls(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_chatbot_first_handled_with_transfer_flag_continues() {
        let outcome = FlowOutcome {
            transfer_to_ai: true,
            ..handled()
        };
        let h = harness(FixedChatbot::returning(outcome), REPLIED);

        let report = h.pipeline.run("c", "hola", AutomationPriority::ChatbotFirst).await;
        assert_eq!(report.final_stage, Stage::Agent);
        assert_eq!(h.calls(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_chatbot_first_unhandled_agent_answers() {
        let h = harness(FixedChatbot::returning(FlowOutcome::unhandled()), REPLIED);

        let report = h.pipeline.run("c", "hola", AutomationPriority::ChatbotFirst).await;
        assert_eq!(report.final_stage, Stage::Agent);
        assert_eq!(h.calls(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_chatbot_error_counts_as_unhandled() {
        let h = harness(FixedChatbot::failing(), AgentOutcome::NoCredits);

        let report = h.pipeline.run("c", "hola", AutomationPriority::ChatbotFirst).await;
        assert_eq!(report.final_stage, Stage::Analyzer);
        assert_eq!(h.calls(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_ai_first_agent_handles() {
        let h = harness(FixedChatbot::returning(handled()), REPLIED);

        let report = h.pipeline.run("c", "hola", AutomationPriority::AiFirst).await;
        assert_eq!(report.final_stage, Stage::Agent);
        assert_eq!(h.calls(), (0, 1, 0));
    }

    #[tokio::test]
    async fn test_ai_first_falls_back_to_chatbot() {
        let h = harness(FixedChatbot::returning(handled()), AgentOutcome::NoCredits);

        let report = h.pipeline.run("c", "hola", AutomationPriority::AiFirst).await;
        assert_eq!(report.stages, vec![Stage::Agent, Stage::Chatbot]);
        assert_eq!(report.final_stage, Stage::Chatbot);
        assert_eq!(h.calls(), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_ai_first_transfer_to_ai_goes_to_analyzer() {
        let h = harness(
            FixedChatbot::returning(transfer_to_ai()),
            AgentOutcome::Disabled,
        );

        let report = h.pipeline.run("c", "hola", AutomationPriority::AiFirst).await;
        assert_eq!(report.final_stage, Stage::Analyzer);
        assert_eq!(h.calls(), (1, 1, 1));
    }

    #[tokio::test]
    async fn test_spawn_runs_in_background() {
        let h = harness(FixedChatbot::returning(handled()), REPLIED);

        let report = h
            .pipeline
            .spawn("c".to_string(), "hola".to_string(), AutomationPriority::ChatbotFirst)
            .await
            .unwrap();
        assert_eq!(report.final_stage, Stage::Chatbot);
    }
}
