//! Chatbot flow engine.
//!
//! A flow is a directed graph of nodes authored by a company. Each node has a message,
//! keyword options leading to other nodes and an optional terminal action. The engine
//! is stateless: [`advance`] takes the conversation's current node and the inbound text
//! and returns what to say and where the conversation goes next.
//!
//! ```rust
//! use chatbot_flow::{advance, ChatbotFlow};
//!
//! let flow = ChatbotFlow::from_json(r#"{
//!     "startNodeId": "start",
//!     "nodes": {
//!         "start": {"message": "Hi", "options": [{"match": ["yes"], "nextNodeId": "A"}]},
//!         "A": {"message": "Great"}
//!     }
//! }"#).unwrap();
//!
//! let outcome = advance(&flow, "start", "YES");
//! assert!(outcome.handled);
//! assert_eq!(outcome.reply.as_deref(), Some("Great"));
//! ```

mod engine;
mod error;
mod flow;
mod validation;

pub use engine::{advance, FlowOutcome};
pub use error::FlowError;
pub use flow::{normalize, ChatbotFlow, FlowAction, FlowNode, FlowOption, MatchMode};
pub use validation::{ensure_valid, validate};
