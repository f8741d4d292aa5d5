//! Canonical message types for the agent transcript
//!
//! Every provider dialect is normalized into these variants, so the agent
//! loop never branches on provider identity. Role-specific fields live on
//! their variant and cannot be absent or mistyped at an access site.

use serde::{Deserialize, Serialize};

/// One turn of the conversation, provider-neutral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCallRequest>,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    /// Create a plain-text assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: vec![],
        }
    }

    /// Create an assistant message with tool calls
    pub fn assistant_with_tools(content: Option<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self::Assistant {
            content,
            tool_calls,
        }
    }

    /// Create a tool result message
    pub fn tool_result(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::ToolResult {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            content: content.into(),
        }
    }

    /// True for the system variant.
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }
}

/// A tool call request emitted by the model.
///
/// `arguments` is always a JSON-encoded string regardless of provider, which
/// keeps the transcript dialect-neutral: OpenAI already sends stringified
/// arguments, and the Gemini adapter stringifies the structured args it gets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(
            msg,
            Message::User {
                content: "Hello".to_string()
            }
        );
        assert!(!msg.is_system());
        assert!(Message::system("prompt").is_system());
    }

    #[test]
    fn test_assistant_with_tools() {
        let call = ToolCallRequest::new("call_1", "send_message", r#"{"message":"hi"}"#);
        let msg = Message::assistant_with_tools(None, vec![call.clone()]);

        match msg {
            Message::Assistant {
                content,
                tool_calls,
            } => {
                assert!(content.is_none());
                assert_eq!(tool_calls, vec![call]);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
