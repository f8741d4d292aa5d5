//! Chat provider abstraction layer.
//!
//! This module provides:
//! - [`ChatProvider`] trait for swappable LLM backends
//! - [`ProviderRegistry`] for backend creation from config
//! - Concrete implementations: OpenAI-compatible, Gemini native
//!
//! The dialect is picked once at construction from explicit configuration;
//! nothing downstream ever inspects URLs or provider identity.

mod types;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolDefinition;
use crate::Result;

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use super::message::Message;

/// Chat provider trait — swappable backend abstraction.
///
/// A provider is stateless per call: it receives the full transcript and
/// tool catalog, returns one canonical assistant message, and keeps nothing
/// between calls. Transport and parse failures surface as
/// [`Error::Provider`] values, never panics.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(
        &self,
        transcript: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Message>;
}

/// Provider registry — creates chat providers from configuration.
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create a chat provider from configuration.
    ///
    /// Supported providers:
    /// - `"openai"`: OpenAI-compatible chat-completions API
    /// - `"gemini"`: Gemini native generateContent API
    pub fn create(config: &Config) -> Result<Box<dyn ChatProvider>> {
        match config.provider.as_str() {
            "openai" => Ok(Box::new(OpenAiClient::with_base_url(
                &config.api_key,
                config.base_url(),
                &config.model,
            ))),
            "gemini" => Ok(Box::new(GeminiClient::with_base_url(
                &config.api_key,
                config.base_url(),
                &config.model,
            ))),
            other => Err(Error::Config(format!("Unknown provider: {other}"))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["openai", "gemini"]
    }
}

/// Fake provider for testing: scripted responses, optionally repeating the
/// last one forever, with a call counter for loop assertions.
#[cfg(test)]
pub struct FakeProvider {
    responses: std::sync::Mutex<std::collections::VecDeque<Message>>,
    repeat_last: bool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FakeProvider {
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            repeat_last: false,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// A provider that returns the same response on every call.
    pub fn repeating(response: Message) -> Self {
        Self {
            responses: std::sync::Mutex::new(vec![response].into()),
            repeat_last: true,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl ChatProvider for FakeProvider {
    async fn complete(
        &self,
        _transcript: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Message> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let mut responses = self.responses.lock().unwrap();
        if self.repeat_last {
            return responses
                .front()
                .cloned()
                .ok_or_else(|| Error::Provider("No scripted response".to_string()));
        }

        responses
            .pop_front()
            .ok_or_else(|| Error::Provider("No more scripted responses".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_provider_scripted() {
        let provider = FakeProvider::new(vec![
            Message::assistant("Hello!"),
            Message::assistant("World!"),
        ]);

        let first = provider.complete(&[], &[]).await.unwrap();
        assert_eq!(first, Message::assistant("Hello!"));

        let second = provider.complete(&[], &[]).await.unwrap();
        assert_eq!(second, Message::assistant("World!"));

        assert!(provider.complete(&[], &[]).await.is_err());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_fake_provider_repeating() {
        let provider = FakeProvider::repeating(Message::assistant("again"));

        for _ in 0..10 {
            let response = provider.complete(&[], &[]).await.unwrap();
            assert_eq!(response, Message::assistant("again"));
        }
        assert_eq!(provider.calls(), 10);
    }

    #[test]
    fn test_registry_rejects_unknown_provider() {
        let config = Config {
            provider: "carrier-pigeon".to_string(),
            ..Config::default()
        };
        assert!(ProviderRegistry::create(&config).is_err());
    }
}
