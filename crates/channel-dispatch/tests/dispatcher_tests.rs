//! Dispatcher behaviour against an in-memory database and a recording client.

use std::sync::Arc;

use channel_dispatch::{
    ChannelDispatcher, DeliveryTarget, DispatchConfig, DispatchError, DispatchOutcome,
    RecordingClient, WhatsAppCredentials,
};
use database::{
    channel, company, conversation, message, AutomationPriority, ChannelType, Database,
};
use serde_json::{json, Value};

async fn setup(kind: ChannelType, config: Value) -> (Database, String) {
    let db = Database::in_memory().await.unwrap();
    let pool = db.pool();
    company::create_company(pool, "acme", "Acme", 0).await.unwrap();
    channel::create_channel(pool, "ch-1", "acme", kind, &config, AutomationPriority::ChatbotFirst)
        .await
        .unwrap();
    let contact = conversation::upsert_contact(pool, "acme", "+573001112233", Some("Ana"))
        .await
        .unwrap();
    let (conv, _) = conversation::find_or_create_conversation(pool, "acme", "ch-1", &contact.id)
        .await
        .unwrap();
    (db, conv.id)
}

fn platform() -> WhatsAppCredentials {
    WhatsAppCredentials {
        phone_number_id: "platform-phone".to_string(),
        access_token: "platform-token".to_string(),
    }
}

#[tokio::test]
async fn test_whatsapp_uses_channel_credentials() {
    let (db, conv_id) = setup(
        ChannelType::WhatsApp,
        json!({"phoneNumberId": "own-phone", "accessToken": "own-token"}),
    )
    .await;
    let client = Arc::new(RecordingClient::new());
    let config = DispatchConfig::default().with_platform_whatsapp(platform());
    let dispatcher = ChannelDispatcher::new(db.clone(), client.clone(), config);

    let outcome = dispatcher
        .send(&conv_id, "acme", "Hola Ana", Some("Bot"))
        .await
        .unwrap();
    assert!(outcome.is_delivered());

    let sent = client.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient_id, "+573001112233");
    assert!(matches!(
        &sent[0].target,
        DeliveryTarget::WhatsApp(c) if c.phone_number_id == "own-phone"
    ));

    let history = message::list_recent_messages(db.pool(), &conv_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].direction, "OUTBOUND");
    assert_eq!(history[0].sender_name.as_deref(), Some("Bot"));

    let conv = conversation::get_conversation(db.pool(), &conv_id).await.unwrap();
    assert!(conv.last_message_at.is_some());
}

#[tokio::test]
async fn test_whatsapp_falls_back_to_platform_sender() {
    let (db, conv_id) = setup(ChannelType::WhatsApp, json!({})).await;
    let client = Arc::new(RecordingClient::new());
    let config = DispatchConfig::default().with_platform_whatsapp(platform());
    let dispatcher = ChannelDispatcher::new(db, client.clone(), config);

    dispatcher.send(&conv_id, "acme", "Hola", None).await.unwrap();

    assert_eq!(
        client.sent()[0].target,
        DeliveryTarget::WhatsApp(platform())
    );
}

#[tokio::test]
async fn test_delivery_failure_is_still_recorded() {
    let (db, conv_id) = setup(ChannelType::WhatsApp, json!({})).await;
    let client = Arc::new(RecordingClient::failing());
    let config = DispatchConfig::default().with_platform_whatsapp(platform());
    let dispatcher = ChannelDispatcher::new(db.clone(), client, config);

    let outcome = dispatcher.send(&conv_id, "acme", "Hola", None).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
    assert!(outcome.message_id().is_some());
    assert_eq!(message::count_messages(db.pool(), &conv_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_whatsapp_without_any_sender_is_recorded_as_failed() {
    let (db, conv_id) = setup(ChannelType::WhatsApp, json!({})).await;
    let client = Arc::new(RecordingClient::new());
    let dispatcher = ChannelDispatcher::new(db.clone(), client.clone(), DispatchConfig::default());

    let outcome = dispatcher.send(&conv_id, "acme", "Hola", None).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Failed { .. }));
    assert!(client.sent().is_empty());
    assert_eq!(message::count_messages(db.pool(), &conv_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_instagram_without_token_is_skipped() {
    let (db, conv_id) = setup(ChannelType::Instagram, json!({})).await;
    let client = Arc::new(RecordingClient::new());
    let config = DispatchConfig::default().with_platform_whatsapp(platform());
    let dispatcher = ChannelDispatcher::new(db.clone(), client.clone(), config);

    let outcome = dispatcher.send(&conv_id, "acme", "Hola", None).await.unwrap();
    assert!(matches!(outcome, DispatchOutcome::Skipped { .. }));
    assert!(client.sent().is_empty());
    assert_eq!(message::count_messages(db.pool(), &conv_id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_instagram_with_token() {
    let (db, conv_id) = setup(ChannelType::Instagram, json!({"accessToken": "ig"})).await;
    let client = Arc::new(RecordingClient::new());
    let dispatcher = ChannelDispatcher::new(db, client.clone(), DispatchConfig::default());

    let outcome = dispatcher.send(&conv_id, "acme", "Hola", None).await.unwrap();
    assert!(outcome.is_delivered());
    assert_eq!(client.texts(), vec!["Hola"]);
}

#[tokio::test]
async fn test_other_company_is_rejected() {
    let (db, conv_id) = setup(ChannelType::WhatsApp, json!({})).await;
    let client = Arc::new(RecordingClient::new());
    let dispatcher = ChannelDispatcher::new(db.clone(), client, DispatchConfig::default());

    let result = dispatcher.send(&conv_id, "intruder", "Hola", None).await;
    assert!(matches!(result, Err(DispatchError::ConversationMismatch { .. })));
    assert_eq!(message::count_messages(db.pool(), &conv_id).await.unwrap(), 0);
}
