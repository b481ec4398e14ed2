mod client;
pub(crate) mod types;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::traits::{GenerateOptions, Generation, TextGenerator, TokenUsage};
use client::AnthropicClient;
use types::*;

pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic Messages API provider.
///
/// The Messages API has no JSON response mode, so `ResponseFormat::Json`
/// relies entirely on the prompt demanding JSON output.
#[derive(Clone)]
pub struct Anthropic {
    api_key: String,
    model: String,
    base_url: Option<String>,
}

impl Anthropic {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
        }
    }

    pub fn from_env(model: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow!("ANTHROPIC_API_KEY environment variable not set"))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> AnthropicClient {
        let client = AnthropicClient::new(&self.api_key);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }
}

#[async_trait]
impl TextGenerator for Anthropic {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: GenerateOptions,
    ) -> Result<Generation> {
        let request = MessagesRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .max_tokens(options.max_tokens)
            .temperature(options.temperature);

        let response = self.client().messages(&request).await?;

        let content = response
            .text()
            .ok_or_else(|| anyhow!("No text content in Anthropic response"))?;

        let usage = response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            })
            .unwrap_or_default();

        Ok(Generation {
            content,
            model: self.model.clone(),
            provider: "anthropic".to_string(),
            usage,
        })
    }
}
