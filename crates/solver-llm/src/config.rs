// Configuration layer for provider-agnostic LLM client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::traits::ChatClient;

/// Configuration for OpenAI-compatible providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    /// Base URL for the API (optional, defaults to https://api.openai.com/v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI(OpenAIConfig),
}

impl ProviderConfig {
    /// Create OpenAI provider config
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::OpenAI(OpenAIConfig::new(api_key))
    }

    /// Point the provider at a compatible gateway instead of the public API
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        match self {
            Self::OpenAI(config) => Self::OpenAI(config.with_base_url(base_url)),
        }
    }
}

/// Factory for creating LLM clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    /// Create a chat client from provider configuration
    pub fn create_chat_client(config: ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        match config {
            ProviderConfig::OpenAI(openai_config) => {
                let mut client = crate::openai::OpenAIClient::new(openai_config.api_key)?;
                if let Some(base_url) = openai_config.base_url {
                    client = client.with_base_url(base_url);
                }
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_config() {
        let ProviderConfig::OpenAI(config) = ProviderConfig::openai("test-key");
        assert_eq!(config.api_key, "test-key");
        assert!(config.base_url.is_none());
    }

    #[test]
    fn test_with_base_url() {
        let ProviderConfig::OpenAI(config) =
            ProviderConfig::openai("test-key").with_base_url("http://localhost:8080/v1");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080/v1"));
    }

    #[test]
    fn test_serde_tagged() {
        let config = ProviderConfig::openai("test-key");
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["type"], "openai");

        let back: ProviderConfig = serde_json::from_value(json).unwrap();
        let ProviderConfig::OpenAI(inner) = back;
        assert_eq!(inner.api_key, "test-key");
    }

    #[test]
    fn test_factory_builds_client() {
        let client = ClientFactory::create_chat_client(ProviderConfig::openai("test-key"));
        assert!(client.is_ok());
    }
}
