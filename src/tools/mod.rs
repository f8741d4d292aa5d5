//! Tools module - the fixed catalog and its dispatcher
//!
//! The agent exposes exactly three tools to the model: sending a message to
//! the user and the two core-memory edits. The catalog is built once at
//! agent construction and never mutated; each provider re-encodes it for its
//! own wire dialect.

pub mod dispatch;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool name for the user-facing send (the loop's yield point).
pub const SEND_MESSAGE: &str = "send_message";
/// Tool name for appending to a memory block.
pub const CORE_MEMORY_APPEND: &str = "core_memory_append";
/// Tool name for the exact-match replace in a memory block.
pub const CORE_MEMORY_REPLACE: &str = "core_memory_replace";

/// Tool definition presented to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    fn new(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// The fixed, ordered tool catalog.
pub fn catalog() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            SEND_MESSAGE,
            "Send a message to the user.",
            json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The content of the message to send."
                    }
                },
                "required": ["message"]
            }),
        ),
        ToolDefinition::new(
            CORE_MEMORY_APPEND,
            "Append to the contents of a specific memory block.",
            json!({
                "type": "object",
                "properties": {
                    "label": {
                        "type": "string",
                        "description": "The label of the memory block (e.g. 'human', 'persona')."
                    },
                    "content": {
                        "type": "string",
                        "description": "The content to append."
                    }
                },
                "required": ["label", "content"]
            }),
        ),
        ToolDefinition::new(
            CORE_MEMORY_REPLACE,
            "Replace the contents of a specific memory block with new content.",
            json!({
                "type": "object",
                "properties": {
                    "label": {
                        "type": "string",
                        "description": "The label of the memory block (e.g. 'human', 'persona')."
                    },
                    "old_content": {
                        "type": "string",
                        "description": "The content to replace. Must match exactly."
                    },
                    "new_content": {
                        "type": "string",
                        "description": "The new content."
                    }
                },
                "required": ["label", "old_content", "new_content"]
            }),
        ),
    ]
}
