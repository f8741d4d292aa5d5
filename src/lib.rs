//! Sam - lightweight stateful AI agent
//!
//! This library provides a conversational agent that keeps a structured,
//! self-editing core memory alongside its chat transcript, and talks to an
//! LLM backend (OpenAI-compatible or Gemini) through tool calls.

pub mod agent;
pub mod config;
pub mod error;
pub mod memory;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
