//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A tenant company with its prepaid credit balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Company {
    /// Company ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Prepaid balance in credits (1 credit = 1 COP).
    pub credit_balance: i64,
    /// Company-owned model provider key, encrypted at rest.
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

impl Company {
    /// Whether the company pays its model provider directly.
    pub fn uses_own_key(&self) -> bool {
        self.openai_api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Messaging channel types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    #[serde(rename = "WHATSAPP")]
    WhatsApp,
    Instagram,
}

impl ChannelType {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::WhatsApp => "WHATSAPP",
            ChannelType::Instagram => "INSTAGRAM",
        }
    }

    /// Parse the stored representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "WHATSAPP" => Some(ChannelType::WhatsApp),
            "INSTAGRAM" => Some(ChannelType::Instagram),
            _ => None,
        }
    }
}

/// Which automation stage gets the first look at an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AutomationPriority {
    #[default]
    ChatbotFirst,
    AiFirst,
}

impl AutomationPriority {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AutomationPriority::ChatbotFirst => "CHATBOT_FIRST",
            AutomationPriority::AiFirst => "AI_FIRST",
        }
    }

    /// Parse the stored representation, falling back to the default.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "AI_FIRST" => AutomationPriority::AiFirst,
            _ => AutomationPriority::ChatbotFirst,
        }
    }
}

/// A company's messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Channel {
    /// Channel ID.
    pub id: String,
    /// Owning company.
    pub company_id: String,
    /// "WHATSAPP" or "INSTAGRAM".
    pub channel_type: String,
    /// Connection status.
    pub status: String,
    /// Opaque per-type credentials and settings (JSON).
    pub config_json: String,
    /// "CHATBOT_FIRST" or "AI_FIRST".
    pub automation_priority: String,
    /// Creation timestamp.
    pub created_at: String,
}

impl Channel {
    /// Parsed channel type, if recognised.
    pub fn kind(&self) -> Option<ChannelType> {
        ChannelType::parse(&self.channel_type)
    }

    /// Parsed automation priority.
    pub fn priority(&self) -> AutomationPriority {
        AutomationPriority::parse(&self.automation_priority)
    }

    /// Parsed config, or an empty object if the stored JSON is malformed.
    pub fn config(&self) -> serde_json::Value {
        serde_json::from_str(&self.config_json).unwrap_or_else(|_| serde_json::json!({}))
    }
}

/// A customer reachable on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    /// Contact ID.
    pub id: String,
    /// Owning company.
    pub company_id: String,
    /// Platform identifier (phone number, Instagram-scoped ID).
    pub external_id: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Conversation lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStatus {
    Open,
    WaitingHuman,
    Closed,
}

impl ConversationStatus {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Open => "OPEN",
            ConversationStatus::WaitingHuman => "WAITING_HUMAN",
            ConversationStatus::Closed => "CLOSED",
        }
    }
}

/// A conversation between a company channel and a contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Conversation ID.
    pub id: String,
    /// Owning company.
    pub company_id: String,
    /// Channel the conversation runs on.
    pub channel_id: String,
    /// The customer.
    pub contact_id: String,
    /// "OPEN", "WAITING_HUMAN" or "CLOSED".
    pub status: String,
    /// Assigned human agent, if any.
    pub assigned_agent_id: Option<String>,
    /// Current chatbot flow position, if the conversation is inside a flow.
    pub flow_node_id: Option<String>,
    /// Last message in either direction.
    pub last_message_at: Option<String>,
    /// Last inbound message.
    pub last_inbound_at: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Conversation {
    /// Whether a human has taken (or been asked to take) this conversation.
    pub fn is_with_human(&self) -> bool {
        self.assigned_agent_id.is_some() || self.status == ConversationStatus::WaitingHuman.as_str()
    }
}

/// Message direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

impl MessageDirection {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Inbound => "INBOUND",
            MessageDirection::Outbound => "OUTBOUND",
        }
    }
}

/// A stored conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// "INBOUND" or "OUTBOUND".
    pub direction: String,
    /// Text content.
    pub content: String,
    /// Display name of the sender (agent name, bot name).
    pub sender_name: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

impl Message {
    /// Whether the customer sent this message.
    pub fn is_inbound(&self) -> bool {
        self.direction == MessageDirection::Inbound.as_str()
    }
}

/// Kinds of balance-affecting events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Recharge,
    AiUsage,
    ManualAdjust,
    Refund,
}

impl TransactionKind {
    /// Stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Recharge => "RECHARGE",
            TransactionKind::AiUsage => "AI_USAGE",
            TransactionKind::ManualAdjust => "MANUAL_ADJUST",
            TransactionKind::Refund => "REFUND",
        }
    }
}

/// A ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CreditTransaction {
    /// Auto-incrementing ID; also the ledger order.
    pub id: i64,
    /// Owning company.
    pub company_id: String,
    /// "RECHARGE", "AI_USAGE", "MANUAL_ADJUST" or "REFUND".
    pub kind: String,
    /// Signed amount: positive credits, negative debits.
    pub amount: i64,
    /// Company balance immediately after this entry.
    pub balance_after: i64,
    /// Human-readable description.
    pub description: String,
    /// External reference (payment transaction ID), unique when present.
    pub reference_id: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// An AI usage audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AiUsageLog {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning company.
    pub company_id: String,
    /// Conversation the usage was incurred for, if any.
    pub conversation_id: Option<String>,
    /// Model name.
    pub model: String,
    /// Prompt tokens.
    pub prompt_tokens: i64,
    /// Completion tokens.
    pub completion_tokens: i64,
    /// Total tokens.
    pub total_tokens: i64,
    /// Credits charged (0 when the company used its own key).
    pub cost_cop: i64,
    /// Whether the company's own provider key was used.
    pub used_own_key: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// A stored chatbot flow definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatbotFlowRecord {
    /// Flow ID.
    pub id: String,
    /// Owning company.
    pub company_id: String,
    /// Channel the flow is bound to; `None` applies to every channel.
    pub channel_id: Option<String>,
    /// Display name.
    pub name: String,
    /// The flow graph (JSON).
    pub flow_json: String,
    /// Whether the flow is live.
    pub active: bool,
    /// Last update timestamp.
    pub updated_at: String,
}

/// The latest AI analysis of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ConversationInsight {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Owning company.
    pub company_id: String,
    /// Analysed conversation.
    pub conversation_id: String,
    /// Tone score in [1, 100].
    pub tone_score: i64,
    /// Clarity score in [1, 100].
    pub clarity_score: i64,
    /// Short summary.
    pub summary: String,
    /// `{sentiment, topics, urgency}` as JSON.
    pub flags_json: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}
