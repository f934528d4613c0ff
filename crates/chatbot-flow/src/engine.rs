//! The flow walker.
//!
//! `advance` is pure: the caller owns the conversation's current node and stores
//! whatever `next_node_id` comes back.

use serde::Serialize;
use tracing::{debug, warn};

use crate::flow::{normalize, ChatbotFlow, FlowAction};

/// Result of feeding one inbound message to the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOutcome {
    /// The flow fully answered the message.
    pub handled: bool,
    /// Message to send back, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    /// New position after a transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    /// Continue with the AI agent.
    pub transfer_to_ai: bool,
    /// Hand the conversation to a human.
    pub transfer_to_human: bool,
    /// The flow finished.
    pub ended: bool,
}

impl FlowOutcome {
    /// The message falls through to the next stage.
    pub fn unhandled() -> Self {
        Self::default()
    }

    fn transition(next_node_id: &str, reply: &str) -> Self {
        Self {
            handled: true,
            reply: (!reply.trim().is_empty()).then(|| reply.to_string()),
            next_node_id: Some(next_node_id.to_string()),
            ..Self::default()
        }
    }

    fn action(action: FlowAction) -> Self {
        match action {
            FlowAction::EndConversation => Self {
                handled: true,
                ended: true,
                ..Self::default()
            },
            FlowAction::TransferToHuman => Self {
                handled: true,
                transfer_to_human: true,
                ..Self::default()
            },
            FlowAction::TransferToAiAgent => Self {
                transfer_to_ai: true,
                ..Self::default()
            },
        }
    }
}

/// Feed `text` to the flow at `current_node_id`.
///
/// Options are tried in declared order and the first match wins. Unknown nodes,
/// including a dangling option target, leave the message unhandled.
pub fn advance(flow: &ChatbotFlow, current_node_id: &str, text: &str) -> FlowOutcome {
    let Some(node) = flow.node(current_node_id) else {
        warn!(node_id = %current_node_id, "Flow position points to unknown node");
        return FlowOutcome::unhandled();
    };

    let normalized = normalize(text);

    if let Some(option) = node
        .options
        .iter()
        .find(|option| option.matches(&normalized, flow.match_mode))
    {
        return match flow.node(&option.next_node_id) {
            Some(next) => {
                debug!(from = %current_node_id, to = %option.next_node_id, "Flow transition");
                FlowOutcome::transition(&option.next_node_id, &next.message)
            }
            None => {
                warn!(
                    node_id = %current_node_id,
                    next_node_id = %option.next_node_id,
                    "Flow option points to unknown node"
                );
                FlowOutcome::unhandled()
            }
        };
    }

    match node.action {
        Some(action) => {
            debug!(node_id = %current_node_id, ?action, "Flow action");
            FlowOutcome::action(action)
        }
        None => FlowOutcome::unhandled(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::MatchMode;

    fn flow(json: &str) -> ChatbotFlow {
        ChatbotFlow::from_json(json).unwrap()
    }

    fn yes_flow() -> ChatbotFlow {
        flow(
            r#"{
                "startNodeId": "start",
                "nodes": {
                    "start": {"message": "Hi", "options": [{"match": ["yes"], "nextNodeId": "A"}]},
                    "A": {"message": "Great"}
                }
            }"#,
        )
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let outcome = advance(&yes_flow(), "start", "YES");
        assert!(outcome.handled);
        assert_eq!(outcome.next_node_id.as_deref(), Some("A"));
        assert_eq!(outcome.reply.as_deref(), Some("Great"));
    }

    #[test]
    fn test_no_match_falls_through() {
        let outcome = advance(&yes_flow(), "start", "no");
        assert_eq!(outcome, FlowOutcome::unhandled());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let outcome = advance(&yes_flow(), "start", "   yes \n");
        assert!(outcome.handled);
    }

    #[test]
    fn test_end_conversation_action() {
        let flow = flow(
            r#"{
                "startNodeId": "bye",
                "nodes": {"bye": {"message": "Bye", "action": {"type": "end_conversation"}}}
            }"#,
        );

        let outcome = advance(&flow, "bye", "anything");
        assert!(outcome.handled);
        assert!(outcome.ended);
        assert_eq!(outcome.reply, None);
    }

    #[test]
    fn test_transfer_actions() {
        let flow = flow(
            r#"{
                "startNodeId": "h",
                "nodes": {
                    "h": {"message": "Te paso con un asesor", "action": {"type": "transfer_to_human"}},
                    "ai": {"message": "Te paso con la IA", "action": {"type": "transfer_to_ai_agent"}}
                }
            }"#,
        );

        let human = advance(&flow, "h", "hola");
        assert!(human.handled && human.transfer_to_human);

        let ai = advance(&flow, "ai", "hola");
        assert!(!ai.handled);
        assert!(ai.transfer_to_ai);
    }

    #[test]
    fn test_first_match_wins() {
        let flow = flow(
            r#"{
                "startNodeId": "s",
                "matchMode": "contains",
                "nodes": {
                    "s": {"message": "?", "options": [
                        {"match": ["precio"], "nextNodeId": "prices"},
                        {"match": ["precio de envío"], "nextNodeId": "shipping"}
                    ]},
                    "prices": {"message": "Nuestros precios"},
                    "shipping": {"message": "Envíos"}
                }
            }"#,
        );

        let outcome = advance(&flow, "s", "¿Cuál es el precio de envío?");
        assert_eq!(outcome.next_node_id.as_deref(), Some("prices"));
    }

    #[test]
    fn test_exact_mode_rejects_substring() {
        let mut flow = yes_flow();
        assert!(!advance(&flow, "start", "yes please").handled);

        flow.match_mode = MatchMode::Contains;
        assert!(advance(&flow, "start", "yes please").handled);
    }

    #[test]
    fn test_option_without_keywords_matches_label() {
        let flow = flow(
            r#"{
                "startNodeId": "menu",
                "nodes": {
                    "menu": {"message": "Elige", "options": [
                        {"label": "Horarios", "nextNodeId": "hours"}
                    ]},
                    "hours": {"message": "Lunes a viernes"}
                }
            }"#,
        );

        let outcome = advance(&flow, "menu", "horarios");
        assert_eq!(outcome.reply.as_deref(), Some("Lunes a viernes"));
    }

    #[test]
    fn test_option_match_beats_action() {
        let flow = flow(
            r#"{
                "startNodeId": "s",
                "nodes": {
                    "s": {
                        "message": "¿Algo más?",
                        "options": [{"match": ["si"], "nextNodeId": "s"}],
                        "action": {"type": "end_conversation"}
                    }
                }
            }"#,
        );

        let again = advance(&flow, "s", "si");
        assert!(again.handled && !again.ended);
        assert_eq!(again.next_node_id.as_deref(), Some("s"));

        let done = advance(&flow, "s", "no");
        assert!(done.ended);
    }

    #[test]
    fn test_unknown_current_node_is_unhandled() {
        assert_eq!(advance(&yes_flow(), "ghost", "yes"), FlowOutcome::unhandled());
    }

    #[test]
    fn test_dangling_option_is_unhandled() {
        let flow = flow(
            r#"{
                "startNodeId": "s",
                "nodes": {"s": {"message": "?", "options": [{"match": ["x"], "nextNodeId": "gone"}]}}
            }"#,
        );

        assert_eq!(advance(&flow, "s", "x"), FlowOutcome::unhandled());
    }

    #[test]
    fn test_empty_node_always_falls_through() {
        let flow = flow(r#"{"startNodeId": "s", "nodes": {"s": {"message": "Hola"}}}"#);
        assert!(!advance(&flow, "s", "").handled);
        assert!(!advance(&flow, "s", "hola").handled);
    }

    #[test]
    fn test_transition_to_silent_node_has_no_reply() {
        let flow = flow(
            r#"{
                "startNodeId": "s",
                "nodes": {
                    "s": {"message": "?", "options": [{"match": ["1"], "nextNodeId": "quiet"}]},
                    "quiet": {"message": "  ", "action": {"type": "transfer_to_human"}}
                }
            }"#,
        );

        let outcome = advance(&flow, "s", "1");
        assert!(outcome.handled);
        assert_eq!(outcome.reply, None);
        assert_eq!(outcome.next_node_id.as_deref(), Some("quiet"));
    }
}
