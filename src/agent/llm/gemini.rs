//! Gemini native API provider.
//!
//! This is the full-transcode dialect: the canonical transcript and tool
//! catalog are reshaped into Gemini's generateContent schema on the way out,
//! and the first candidate's parts are folded back into one canonical
//! assistant message on the way in. The agent loop only ever sees canonical
//! messages.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::agent::message::{Message, ToolCallRequest};
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

use super::types::GeminiResponse;
use super::ChatProvider;

pub const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini generateContent client (API key authentication).
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self::with_base_url(api_key, GEMINI_API_URL, model)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

/// Convert the canonical transcript into Gemini `contents` turns.
///
/// The system message is excluded here; it travels in the dedicated
/// `system_instruction` field instead.
fn convert_messages(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::System { .. } => None,
            Message::User { content } => Some(json!({
                "role": "user",
                "parts": [{"text": content}]
            })),
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let parts: Vec<Value> = if tool_calls.is_empty() {
                    vec![json!({"text": content.clone().unwrap_or_default()})]
                } else {
                    tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "functionCall": {
                                    "name": tc.name,
                                    "args": parse_arguments(&tc.arguments)
                                }
                            })
                        })
                        .collect()
                };

                Some(json!({"role": "model", "parts": parts}))
            }
            Message::ToolResult {
                tool_name, content, ..
            } => {
                // Structured tool results pass through as-is; plain text is
                // wrapped so the response field is always a JSON object.
                let response: Value = serde_json::from_str(content)
                    .unwrap_or_else(|_| json!({"result": content}));

                Some(json!({
                    "role": "function",
                    "parts": [{
                        "functionResponse": {
                            "name": tool_name,
                            "response": response
                        }
                    }]
                }))
            }
        })
        .collect()
}

fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| json!({}))
}

fn system_instruction(messages: &[Message]) -> Option<&str> {
    messages.iter().find_map(|m| match m {
        Message::System { content } => Some(content.as_str()),
        _ => None,
    })
}

/// Flatten the catalog into a single `function_declarations` tools entry.
fn convert_tools(tools: &[ToolDefinition]) -> Option<Value> {
    if tools.is_empty() {
        return None;
    }

    let declarations: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "parameters": t.parameters
            })
        })
        .collect();

    Some(json!([{"function_declarations": declarations}]))
}

/// Fold the first candidate's parts into one canonical assistant message.
fn parse_response(response: GeminiResponse) -> Result<Message> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::Provider("No candidates in Gemini response".to_string()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();

    for part in candidate.content.parts {
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(fc) = part.function_call {
            // Gemini supplies no call id; derive one from the tool name.
            tool_calls.push(ToolCallRequest::new(
                format!("call_{}", fc.name),
                fc.name,
                fc.args.to_string(),
            ));
        }
    }

    let content = if text.is_empty() { None } else { Some(text) };
    Ok(Message::assistant_with_tools(content, tool_calls))
}

#[async_trait]
impl ChatProvider for GeminiClient {
    async fn complete(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message> {
        let mut request = json!({
            "contents": convert_messages(transcript),
        });

        if let Some(system) = system_instruction(transcript) {
            request["system_instruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        if let Some(tool_config) = convert_tools(tools) {
            request["tools"] = tool_config;
        }

        let response = self
            .client
            .post(self.build_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(Error::Provider(format!("Gemini API error: {error_text}")));
        }

        let body = response.text().await?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Provider(format!("Unexpected Gemini response ({e}): {body}")))?;

        parse_response(gemini_response)
    }
}
