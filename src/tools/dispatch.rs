//! Tool dispatcher - executes model-issued tool calls against core memory
//!
//! Every path returns a [`ToolOutcome`]; nothing here panics or propagates an
//! error past the dispatch boundary. Failed calls (unknown tool, malformed
//! arguments, missing block, read-only block, unmatched old content) become
//! ERROR outcomes that re-enter the model's context as tool results.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::memory::CoreMemory;

use super::{CORE_MEMORY_APPEND, CORE_MEMORY_REPLACE, SEND_MESSAGE};

/// Destination for user-visible agent output.
pub trait OutputSink: Send + Sync {
    fn deliver(&self, message: &str);
}

/// Status of one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

/// Structured result of one tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutcome {
    pub status: ToolStatus,
    pub message: String,
}

impl ToolOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ToolStatus::Ok
    }

    /// Serialize for the transcript's tool-result content.
    pub fn to_json(&self) -> String {
        // Two string fields; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AppendArgs {
    label: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReplaceArgs {
    label: String,
    old_content: String,
    new_content: String,
}

/// A decoded tool call, one variant per handler.
#[derive(Debug)]
enum ToolRequest {
    SendMessage(SendMessageArgs),
    Append(AppendArgs),
    Replace(ReplaceArgs),
}

impl ToolRequest {
    /// Decode a named call's raw JSON arguments into its variant.
    fn decode(name: &str, raw_args: &str) -> Result<Self, ToolOutcome> {
        let decoded = match name {
            SEND_MESSAGE => serde_json::from_str(raw_args).map(Self::SendMessage),
            CORE_MEMORY_APPEND => serde_json::from_str(raw_args).map(Self::Append),
            CORE_MEMORY_REPLACE => serde_json::from_str(raw_args).map(Self::Replace),
            other => return Err(ToolOutcome::error(format!("Unknown tool: {}", other))),
        };

        decoded.map_err(|e| ToolOutcome::error(format!("Invalid arguments for {}: {}", name, e)))
    }
}

/// Execute one tool call against memory and the output sink.
pub fn execute(
    memory: &mut CoreMemory,
    sink: &dyn OutputSink,
    name: &str,
    raw_args: &str,
) -> ToolOutcome {
    debug!("Executing tool: {} with args: {}", name, raw_args);

    let request = match ToolRequest::decode(name, raw_args) {
        Ok(request) => request,
        Err(outcome) => return outcome,
    };

    match request {
        ToolRequest::SendMessage(args) => {
            sink.deliver(&args.message);
            ToolOutcome::ok("Message sent to user.")
        }
        ToolRequest::Append(args) => {
            let Some(block) = memory.get_block(&args.label) else {
                return ToolOutcome::error(format!("Block not found: {}", args.label));
            };

            let new_value = format!("{}\n{}", block.value, args.content);
            if memory.update_block(&args.label, new_value) {
                ToolOutcome::ok(format!("Memory block '{}' updated.", args.label))
            } else {
                ToolOutcome::error("Failed to update block (maybe read-only?)")
            }
        }
        ToolRequest::Replace(args) => {
            let Some(block) = memory.get_block(&args.label) else {
                return ToolOutcome::error(format!("Block not found: {}", args.label));
            };

            // First occurrence only; a wide edit needs an exact wide match.
            let Some(pos) = block.value.find(&args.old_content) else {
                return ToolOutcome::error("Old content not found in block.");
            };

            let mut new_value = block.value.clone();
            new_value.replace_range(pos..pos + args.old_content.len(), &args.new_content);

            if memory.update_block(&args.label, new_value) {
                ToolOutcome::ok(format!("Memory block '{}' updated.", args.label))
            } else {
                ToolOutcome::error("Failed to update block (maybe read-only?)")
            }
        }
    }
}

/// Whether a successful call to this tool should refresh the system prompt.
pub fn mutates_memory(name: &str) -> bool {
    matches!(name, CORE_MEMORY_APPEND | CORE_MEMORY_REPLACE)
}
