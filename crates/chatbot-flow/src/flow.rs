//! Flow graph types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::FlowError;

/// How inbound text is compared with an option's keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The normalized text equals a keyword.
    #[default]
    Exact,
    /// The normalized text contains a keyword.
    Contains,
}

/// Terminal action of a node, run when no option matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowAction {
    TransferToHuman,
    TransferToAiAgent,
    EndConversation,
}

/// A transition out of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOption {
    /// Text shown to the customer.
    #[serde(default)]
    pub label: String,
    /// Keywords selecting this option; when empty the label is used.
    #[serde(rename = "match", alias = "keywords", default)]
    pub keywords: Vec<String>,
    /// Node entered when the option is selected.
    pub next_node_id: String,
}

/// One state of the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    /// Message sent when the node is entered.
    #[serde(default)]
    pub message: String,
    /// Transitions, tested in declared order.
    #[serde(default)]
    pub options: Vec<FlowOption>,
    /// Action run when no option matches.
    #[serde(default)]
    pub action: Option<FlowAction>,
}

/// A company-authored decision graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatbotFlow {
    pub start_node_id: String,
    pub nodes: HashMap<String, FlowNode>,
    #[serde(default)]
    pub match_mode: MatchMode,
}

impl ChatbotFlow {
    /// Parse a stored flow definition.
    pub fn from_json(json: &str) -> Result<Self, FlowError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a node.
    pub fn node(&self, node_id: &str) -> Option<&FlowNode> {
        self.nodes.get(node_id)
    }

    /// The entry node, if the start id is valid.
    pub fn start_node(&self) -> Option<&FlowNode> {
        self.node(&self.start_node_id)
    }
}

impl FlowOption {
    /// Whether already-normalized inbound text selects this option.
    pub fn matches(&self, text: &str, mode: MatchMode) -> bool {
        self.needles().any(|needle| match mode {
            MatchMode::Exact => text == needle,
            MatchMode::Contains => text.contains(&needle),
        })
    }

    /// Normalized, non-empty keywords; the label stands in when none are given.
    pub fn needles(&self) -> impl Iterator<Item = String> + '_ {
        let label = self.keywords.is_empty().then_some(&self.label);
        self.keywords
            .iter()
            .chain(label)
            .map(|k| normalize(k))
            .filter(|needle| !needle.is_empty())
    }
}

/// Case-folded, trimmed text used for matching.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
