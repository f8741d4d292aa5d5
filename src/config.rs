//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agent::llm::{gemini::GEMINI_API_URL, openai::OPENAI_API_URL};
use crate::error::Error;
use crate::Result;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chat provider to use ("openai" or "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// API key for the selected provider
    #[serde(default)]
    pub api_key: String,

    /// Base URL override (defaults per provider when empty)
    #[serde(default)]
    pub base_url: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum provider calls per user turn
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_steps() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_key: String::new(),
            base_url: String::new(),
            model: default_model(),
            max_steps: default_max_steps(),
        }
    }
}

impl Config {
    /// Effective base URL: the configured override, or the provider default.
    pub fn base_url(&self) -> &str {
        if !self.base_url.is_empty() {
            return &self.base_url;
        }
        match self.provider.as_str() {
            "openai" => OPENAI_API_URL,
            _ => GEMINI_API_URL,
        }
    }

    /// API key from config, falling back to the provider's conventional
    /// environment variable.
    pub fn resolved_api_key(&self) -> Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }

        let var = match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            _ => "GEMINI_API_KEY",
        };

        std::env::var(var).map_err(|_| {
            Error::Config(format!(
                "No API key configured and {var} environment variable not set"
            ))
        })
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".sam")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from file
pub fn load() -> Result<Config> {
    let path = config_path();

    if !path.exists() {
        return Err(Error::Config(format!(
            "Config not found at {:?}. Run 'sam onboard' first.",
            path
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, content)?;
    Ok(())
}

/// Interactive setup wizard
pub fn onboard() -> Result<()> {
    use crate::ui;
    use inquire::{Select, Text};

    println!("  Welcome! Let's get Sam configured.\n");

    let mut config = Config::default();

    let providers = vec!["Gemini (native API)", "OpenAI-compatible"];
    let provider_choice = Select::new("Choose your chat provider:", providers)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;

    if provider_choice.contains("OpenAI") {
        config.provider = "openai".to_string();
        config.model = "gpt-4o-mini".to_string();
    } else {
        config.provider = "gemini".to_string();
    }

    let key = Text::new("Enter your API key (empty to use the environment variable):")
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.api_key = key;

    let model = Text::new("Model:")
        .with_default(&config.model)
        .prompt()
        .map_err(|e| Error::Config(format!("Prompt failed: {}", e)))?;
    config.model = model;

    save(&config)?;

    println!();
    ui::print_success("Setup complete!");
    ui::print_step("Chat: sam chat");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, "gemini");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.max_steps, 5);
    }

    #[test]
    fn test_base_url_defaults_per_provider() {
        let mut config = Config::default();
        assert!(config.base_url().contains("googleapis.com"));

        config.provider = "openai".to_string();
        assert!(config.base_url().contains("api.openai.com"));

        config.base_url = "http://localhost:8080/v1".to_string();
        assert_eq!(config.base_url(), "http://localhost:8080/v1");
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.max_steps, config.max_steps);
    }
}
