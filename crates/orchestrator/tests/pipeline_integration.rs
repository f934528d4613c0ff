//! Pipeline stages against an in-memory database, scripted providers and a
//! recording messaging client.

use std::sync::Arc;

use channel_dispatch::{ChannelDispatcher, DispatchConfig, RecordingClient};
use database::{
    channel, chatbot_flow as flow_store, company, conversation, credit, insight, message, AutomationPriority,
    ChannelType, Database, MessageDirection,
};
use ledger::Ledger;
use mock_brain::{Brain, BrainError, FailingBrain, ScriptedBrain};
use orchestrator::{
    AgentOutcome, AgentStage, AiAgent, AnalyzerStage, ChatbotResponder, ChatbotStage,
    ConversationAnalyzer, FixedProviders, KeyCipher, Pipeline, ProviderResolver, Stage,
};
use serde_json::{json, Value};

const KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

const FLOW: &str = r#"{
    "startNodeId": "start",
    "nodes": {
        "start": {
            "message": "Hola, escribe 1 para ventas o 2 para soporte",
            "options": [
                {"match": ["1", "ventas"], "nextNodeId": "sales"},
                {"match": ["2", "soporte"], "nextNodeId": "support"}
            ]
        },
        "sales": {"message": "Te comunico con ventas", "action": {"type": "transfer_to_human"}},
        "support": {"message": "Cuéntanos tu problema", "action": {"type": "transfer_to_ai_agent"}}
    }
}"#;

struct World {
    db: Database,
    client: Arc<RecordingClient>,
    dispatcher: ChannelDispatcher,
    ledger: Ledger,
    conversation_id: String,
}

async fn world(balance: i64, channel_config: Value) -> World {
    let db = Database::in_memory().await.unwrap();
    let pool = db.pool();
    company::create_company(pool, "acme", "Acme", balance).await.unwrap();
    channel::create_channel(
        pool,
        "wa-1",
        "acme",
        ChannelType::WhatsApp,
        &channel_config,
        AutomationPriority::ChatbotFirst,
    )
    .await
    .unwrap();
    let contact = conversation::upsert_contact(pool, "acme", "+573001112233", Some("Ana"))
        .await
        .unwrap();
    let (conv, _) = conversation::find_or_create_conversation(pool, "acme", "wa-1", &contact.id)
        .await
        .unwrap();

    let client = Arc::new(RecordingClient::new());
    let dispatcher = ChannelDispatcher::new(db.clone(), client.clone(), DispatchConfig::default());

    World {
        ledger: Ledger::new(db.clone()),
        db,
        client,
        dispatcher,
        conversation_id: conv.id,
    }
}

fn wa_config() -> Value {
    json!({"phoneNumberId": "111", "accessToken": "tok"})
}

impl World {
    async fn inbound(&self, text: &str) {
        message::insert_message(
            self.db.pool(),
            &self.conversation_id,
            MessageDirection::Inbound,
            text,
            None,
        )
        .await
        .unwrap();
    }

    fn resolver(&self, brain: Arc<dyn Brain>) -> ProviderResolver {
        ProviderResolver::new(
            Arc::new(FixedProviders::new(brain)),
            Some(KeyCipher::from_encoded(KEY_HEX).unwrap()),
        )
    }

    fn agent(&self, brain: Arc<dyn Brain>) -> AiAgent {
        AiAgent::new(
            self.db.clone(),
            self.ledger.clone(),
            self.resolver(brain),
            self.dispatcher.clone(),
        )
    }

    fn analyzer(&self, brain: Arc<dyn Brain>) -> ConversationAnalyzer {
        ConversationAnalyzer::new(self.db.clone(), self.ledger.clone(), self.resolver(brain))
    }

    async fn flow_node(&self) -> Option<String> {
        conversation::get_conversation(self.db.pool(), &self.conversation_id)
            .await
            .unwrap()
            .flow_node_id
    }

    async fn balance(&self) -> i64 {
        company::get_balance(self.db.pool(), "acme").await.unwrap()
    }
}

#[tokio::test]
async fn test_chatbot_walks_the_flow() {
    let w = world(0, wa_config()).await;
    flow_store::upsert_flow(w.db.pool(), "f1", "acme", None, "Menú", FLOW)
        .await
        .unwrap();
    let chatbot = ChatbotResponder::new(w.db.clone(), w.dispatcher.clone());

    let first = chatbot.handle(&w.conversation_id, "buenas").await.unwrap();
    assert!(first.handled);
    assert_eq!(w.flow_node().await.as_deref(), Some("start"));

    let second = chatbot.handle(&w.conversation_id, "VENTAS").await.unwrap();
    assert!(second.handled);
    assert_eq!(w.flow_node().await.as_deref(), Some("sales"));

    let third = chatbot.handle(&w.conversation_id, "gracias").await.unwrap();
    assert!(third.transfer_to_human);
    let conv = conversation::get_conversation(w.db.pool(), &w.conversation_id)
        .await
        .unwrap();
    assert_eq!(conv.status, "WAITING_HUMAN");
    assert_eq!(conv.flow_node_id, None);

    assert_eq!(
        w.client.texts(),
        vec![
            "Hola, escribe 1 para ventas o 2 para soporte",
            "Te comunico con ventas"
        ]
    );
}

#[tokio::test]
async fn test_chatbot_restarts_when_position_was_removed() {
    let w = world(0, wa_config()).await;
    flow_store::upsert_flow(w.db.pool(), "f1", "acme", None, "Menú", FLOW)
        .await
        .unwrap();
    let chatbot = ChatbotResponder::new(w.db.clone(), w.dispatcher.clone());

    chatbot.handle(&w.conversation_id, "hola").await.unwrap();
    chatbot.handle(&w.conversation_id, "2").await.unwrap();
    assert_eq!(w.flow_node().await.as_deref(), Some("support"));

    let edited = r#"{
        "startNodeId": "menu",
        "nodes": {
            "menu": {"message": "Nuevo menú", "options": []}
        }
    }"#;
    flow_store::upsert_flow(w.db.pool(), "f1", "acme", None, "Menú", edited)
        .await
        .unwrap();

    let outcome = chatbot.handle(&w.conversation_id, "sigo aquí").await.unwrap();
    assert!(outcome.handled);
    assert_eq!(outcome.next_node_id.as_deref(), Some("menu"));
    assert_eq!(w.flow_node().await.as_deref(), Some("menu"));
    assert_eq!(w.client.texts().last().map(String::as_str), Some("Nuevo menú"));
}

#[tokio::test]
async fn test_chatbot_without_flow_is_unhandled() {
    let w = world(0, wa_config()).await;
    let chatbot = ChatbotResponder::new(w.db.clone(), w.dispatcher.clone());

    let outcome = chatbot.handle(&w.conversation_id, "hola").await.unwrap();
    assert!(!outcome.handled);
    assert!(w.client.sent().is_empty());
}

#[tokio::test]
async fn test_agent_replies_and_charges() {
    let w = world(1_000, wa_config()).await;
    w.inbound("¿Tienen envíos a Medellín?").await;
    let brain = Arc::new(ScriptedBrain::new().reply("Sí, enviamos a todo el país.", 10_000, 2_000));

    let outcome = w
        .agent(brain.clone())
        .respond(&w.conversation_id, "¿Tienen envíos a Medellín?")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::Replied { cost: Some(11) });
    assert_eq!(w.balance().await, 989);
    assert_eq!(w.client.texts(), vec!["Sí, enviamos a todo el país."]);

    let request = &brain.requests()[0];
    assert_eq!(request.messages[0].role, "system");
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[1].content, "¿Tienen envíos a Medellín?");

    let logs = credit::list_usage_logs(w.db.pool(), "acme", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].conversation_id.as_deref(), Some(w.conversation_id.as_str()));
}

#[tokio::test]
async fn test_agent_without_credits_never_calls_provider() {
    let w = world(0, wa_config()).await;
    let brain = Arc::new(ScriptedBrain::new().reply("no debería", 1, 1));

    let outcome = w
        .agent(brain.clone())
        .respond(&w.conversation_id, "hola")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::NoCredits);
    assert_eq!(brain.call_count(), 0);
    assert!(w.client.sent().is_empty());
}

#[tokio::test]
async fn test_agent_with_own_key_only_logs_usage() {
    let w = world(0, wa_config()).await;
    let sealed = KeyCipher::from_encoded(KEY_HEX)
        .unwrap()
        .seal("sk-acme")
        .unwrap();
    company::set_openai_api_key(w.db.pool(), "acme", Some(&sealed))
        .await
        .unwrap();
    let brain = Arc::new(ScriptedBrain::new().reply("Hola Ana", 500, 20));

    let outcome = w
        .agent(brain)
        .respond(&w.conversation_id, "hola")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::Replied { cost: None });
    assert_eq!(w.balance().await, 0);
    assert!(w.ledger.history("acme", 10).await.unwrap().is_empty());

    let logs = credit::list_usage_logs(w.db.pool(), "acme", 10).await.unwrap();
    assert!(logs[0].used_own_key);
}

#[tokio::test]
async fn test_agent_bills_even_when_reply_cannot_be_recorded() {
    let w = world(1_000, wa_config()).await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_outbound BEFORE INSERT ON messages
        WHEN NEW.direction = 'OUTBOUND'
        BEGIN
            SELECT RAISE(ABORT, 'disk full');
        END
        "#,
    )
    .execute(w.db.pool())
    .await
    .unwrap();
    let brain = Arc::new(ScriptedBrain::new().reply("Claro que sí", 10_000, 2_000));

    let result = w
        .agent(brain.clone())
        .respond(&w.conversation_id, "hola")
        .await;

    assert!(result.is_err());
    assert_eq!(brain.call_count(), 1);
    assert_eq!(w.balance().await, 989);
    let logs = credit::list_usage_logs(w.db.pool(), "acme", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn test_agent_empty_reply_is_still_billed() {
    let w = world(1_000, wa_config()).await;
    let brain = Arc::new(ScriptedBrain::new().reply("   ", 10_000, 2_000));

    let outcome = w
        .agent(brain)
        .respond(&w.conversation_id, "hola")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::ProviderUnavailable);
    assert_eq!(w.balance().await, 989);
    assert!(w.client.sent().is_empty());
}

#[tokio::test]
async fn test_agent_provider_failure_degrades() {
    let w = world(1_000, wa_config()).await;
    let brain = Arc::new(FailingBrain::new());

    let outcome = w
        .agent(brain.clone())
        .respond(&w.conversation_id, "hola")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::ProviderUnavailable);
    assert_eq!(brain.call_count(), 1);
    assert_eq!(w.balance().await, 1_000);
    assert!(w.client.sent().is_empty());
}

#[tokio::test]
async fn test_agent_disabled_by_channel() {
    let w = world(1_000, json!({"aiAgent": {"enabled": false}})).await;
    let brain = Arc::new(ScriptedBrain::new());

    let outcome = w
        .agent(brain.clone())
        .respond(&w.conversation_id, "hola")
        .await
        .unwrap();

    assert_eq!(outcome, AgentOutcome::Disabled);
    assert_eq!(brain.call_count(), 0);
}

#[tokio::test]
async fn test_analyzer_keeps_one_live_insight() {
    let w = world(1_000, wa_config()).await;
    w.inbound("Mi pedido no ha llegado").await;

    let brain = Arc::new(
        ScriptedBrain::new()
            .reply(
                r#"{"toneScore": 130, "clarityScore": 0, "summary": "Pedido retrasado",
                    "sentiment": "negative", "topics": ["envío","pedido","a","b","c","d"],
                    "urgency": "high"}"#,
                800,
                60,
            )
            .reply(
                r#"{"toneScore": 72.4, "clarityScore": 88.6, "summary": "Resuelto",
                    "sentiment": "positive", "topics": ["envío"], "urgency": "low"}"#,
                900,
                50,
            ),
    );
    let analyzer = w.analyzer(brain.clone());

    let first = analyzer.analyze(&w.conversation_id).await.unwrap();
    assert_eq!(first.tone_score, 100);
    assert_eq!(first.clarity_score, 1);
    let flags: Value = serde_json::from_str(&first.flags_json).unwrap();
    assert_eq!(flags["topics"].as_array().unwrap().len(), 5);

    let second = analyzer.analyze(&w.conversation_id).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.tone_score, 72);
    assert_eq!(second.clarity_score, 89);
    assert_eq!(second.summary, "Resuelto");

    assert_eq!(
        insight::count_insights(w.db.pool(), &w.conversation_id).await.unwrap(),
        1
    );
    assert!(brain.requests()[0].messages[1]
        .content
        .contains("Cliente: Mi pedido no ha llegado"));
    assert!(w.balance().await < 1_000);
}

#[tokio::test]
async fn test_analyzer_returns_none_when_it_cannot_run() {
    let w = world(1_000, wa_config()).await;
    let brain = Arc::new(ScriptedBrain::new().reply("{}", 1, 1));

    assert!(w.analyzer(brain.clone()).analyze(&w.conversation_id).await.is_none());
    assert_eq!(brain.call_count(), 0);

    w.inbound("hola").await;
    let failing = Arc::new(ScriptedBrain::new().fail(BrainError::Timeout));
    assert!(w.analyzer(failing).analyze(&w.conversation_id).await.is_none());

    let garbage = Arc::new(ScriptedBrain::new().reply("no es json", 10, 10));
    assert!(w.analyzer(garbage).analyze(&w.conversation_id).await.is_none());
    assert_eq!(
        insight::count_insights(w.db.pool(), &w.conversation_id).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_standard_pipeline_transfer_to_ai() {
    let w = world(1_000, wa_config()).await;
    flow_store::upsert_flow(w.db.pool(), "f1", "acme", Some("wa-1"), "Menú", FLOW)
        .await
        .unwrap();
    let brain = Arc::new(
        ScriptedBrain::new()
            .reply("Claro, ¿cuál es tu número de pedido?", 300, 30)
            .reply("{}", 1, 1),
    );
    let pipeline = Pipeline::standard(
        w.db.clone(),
        w.ledger.clone(),
        w.dispatcher.clone(),
        w.resolver(brain.clone()),
    );

    w.inbound("hola").await;
    let report = pipeline
        .run(&w.conversation_id, "hola", AutomationPriority::ChatbotFirst)
        .await;
    assert_eq!(report.final_stage, Stage::Chatbot);

    w.inbound("2").await;
    let report = pipeline
        .run(&w.conversation_id, "2", AutomationPriority::ChatbotFirst)
        .await;
    assert_eq!(report.final_stage, Stage::Chatbot);
    assert_eq!(w.flow_node().await.as_deref(), Some("support"));

    w.inbound("No funciona mi app").await;
    let report = pipeline
        .run(&w.conversation_id, "No funciona mi app", AutomationPriority::ChatbotFirst)
        .await;
    assert_eq!(report.stages, vec![Stage::Chatbot, Stage::Agent]);
    assert_eq!(report.final_stage, Stage::Agent);

    assert_eq!(
        w.client.texts().last().map(String::as_str),
        Some("Claro, ¿cuál es tu número de pedido?")
    );
    assert_eq!(brain.call_count(), 1);
}
