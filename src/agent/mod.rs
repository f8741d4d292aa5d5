//! Agent module - the control loop and its provider adaptation layer

pub mod llm;
pub mod loop_impl;
pub mod message;

pub use llm::{ChatProvider, GeminiClient, OpenAiClient, ProviderRegistry};
pub use loop_impl::{Agent, DEFAULT_MAX_STEPS};
pub use message::{Message, ToolCallRequest};
