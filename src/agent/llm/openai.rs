//! OpenAI-compatible chat-completions provider.
//!
//! The canonical transcript maps almost verbatim onto this dialect, so the
//! adapter is mostly field renames plus the `{type: "function"}` wrapper
//! around each tool descriptor.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::agent::message::{Message, ToolCallRequest};
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::ChatProvider;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Chat-completions client for OpenAI and API-compatible servers.
#[derive(Clone)]
pub struct OpenAiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL, model)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }
}

fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|m| match m {
            Message::System { content } => json!({"role": "system", "content": content}),
            Message::User { content } => json!({"role": "user", "content": content}),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut msg = json!({"role": "assistant", "content": content});
                if !tool_calls.is_empty() {
                    let calls: Vec<Value> = tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "id": tc.id,
                                "type": "function",
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments
                                }
                            })
                        })
                        .collect();
                    msg["tool_calls"] = json!(calls);
                }
                msg
            }
            Message::ToolResult {
                call_id,
                tool_name,
                content,
            } => json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": tool_name,
                "content": content
            }),
        })
        .collect()
}

/// Wrap each descriptor in the `{type: "function", function: {...}}` shape.
fn convert_tools(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters
                }
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

fn parse_response(response: ChatResponse) -> Result<Message> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("No choices in chat response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| ToolCallRequest::new(tc.id, tc.function.name, tc.function.arguments))
        .collect();

    Ok(Message::assistant_with_tools(
        choice.message.content,
        tool_calls,
    ))
}

#[async_trait]
impl ChatProvider for OpenAiClient {
    async fn complete(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message> {
        let mut request = json!({
            "model": self.model,
            "messages": convert_messages(transcript),
        });

        if !tools.is_empty() {
            request["tools"] = json!(convert_tools(tools));
            request["tool_choice"] = json!("auto");
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Provider(format!("Chat API error: {error_text}")));
        }

        let body = response.text().await?;
        let chat_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Provider(format!("Unexpected chat response ({e}): {body}")))?;

        parse_response(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools;

    #[test]
    fn test_convert_messages_all_roles() {
        let transcript = vec![
            Message::system("sys"),
            Message::user("hi"),
            Message::assistant_with_tools(
                None,
                vec![ToolCallRequest::new("c1", "send_message", r#"{"message":"x"}"#)],
            ),
            Message::tool_result("c1", "send_message", r#"{"status":"OK"}"#),
        ];

        let wire = convert_messages(&transcript);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[1]["role"], "user");
        assert_eq!(wire[2]["role"], "assistant");
        assert_eq!(wire[2]["tool_calls"][0]["function"]["name"], "send_message");
        // Arguments stay a JSON-encoded string on the wire.
        assert!(wire[2]["tool_calls"][0]["function"]["arguments"].is_string());
        assert_eq!(wire[3]["role"], "tool");
        assert_eq!(wire[3]["tool_call_id"], "c1");
    }

    #[test]
    fn test_convert_tools_wraps_function_shape() {
        let wire = convert_tools(&tools::catalog());
        assert_eq!(wire.len(), 3);
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "send_message");
        assert_eq!(wire[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let body = json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "core_memory_append",
                            "arguments": "{\"label\":\"human\",\"content\":\"v\"}"
                        }
                    }]
                }
            }]
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();

        let message = parse_response(response).unwrap();
        match message {
            Message::Assistant {
                content,
                tool_calls,
            } => {
                assert!(content.is_none());
                assert_eq!(tool_calls[0].id, "call_abc");
                assert_eq!(tool_calls[0].name, "core_memory_append");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_plain_text() {
        let body = json!({
            "choices": [{"message": {"content": "Hello!"}}]
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();

        let message = parse_response(response).unwrap();
        assert_eq!(message, Message::assistant("Hello!"));
    }

    #[test]
    fn test_parse_response_no_choices_is_error() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(parse_response(response).is_err());
    }
}
