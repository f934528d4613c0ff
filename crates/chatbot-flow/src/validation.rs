//! Static checks for flow definitions.
//!
//! Invalid flows still run (the engine fails open); these checks are for editors and
//! for logging configuration mistakes.

use crate::error::FlowError;
use crate::flow::ChatbotFlow;

/// Every configuration problem in the flow, in a stable order.
pub fn validate(flow: &ChatbotFlow) -> Vec<FlowError> {
    let mut problems = Vec::new();

    if !flow.nodes.contains_key(&flow.start_node_id) {
        problems.push(FlowError::MissingStartNode(flow.start_node_id.clone()));
    }

    let mut node_ids: Vec<&String> = flow.nodes.keys().collect();
    node_ids.sort();

    for node_id in node_ids {
        let node = &flow.nodes[node_id];
        for (index, option) in node.options.iter().enumerate() {
            let selectable = option.needles().next().is_some();
            if !selectable {
                problems.push(FlowError::EmptyOption {
                    node_id: node_id.clone(),
                    index,
                });
            }

            if !flow.nodes.contains_key(&option.next_node_id) {
                problems.push(FlowError::DanglingOption {
                    node_id: node_id.clone(),
                    index,
                    next_node_id: option.next_node_id.clone(),
                });
            }
        }
    }

    problems
}

/// Ok when [`validate`] finds nothing, otherwise the first problem.
pub fn ensure_valid(flow: &ChatbotFlow) -> Result<(), FlowError> {
    match validate(flow).into_iter().next() {
        Some(problem) => Err(problem),
        None => Ok(()),
    }
}
