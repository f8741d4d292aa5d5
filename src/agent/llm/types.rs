//! Wire types for Gemini generateContent responses.

use serde::Deserialize;
use serde_json::Value;

/// Top-level Gemini API response.
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// A single response candidate.
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Content,
}

/// Content block containing parts.
#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A single part of the response (text or function call).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub function_call: Option<FunctionCall>,
}

/// Function call requested by the model.
#[derive(Debug, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Value,
}
