use anyhow::Result;
use async_trait::async_trait;

/// How the model should shape its reply.
///
/// `Json` asks for a single JSON object. OpenAI enforces this at the
/// API level; Anthropic has no equivalent switch, so there the prompt
/// text carries the constraint and `Json` changes nothing on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Text,
    Json,
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub response_format: ResponseFormat,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
            response_format: ResponseFormat::Text,
        }
    }
}

impl GenerateOptions {
    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// One completed generation, tagged with the provider and model that
/// produced it so downstream records stay attributable.
#[derive(Debug, Clone)]
pub struct Generation {
    pub content: String,
    pub model: String,
    pub provider: String,
    pub usage: TokenUsage,
}

/// A provider that turns a system prompt and a user message into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        system: &str,
        user: &str,
        options: GenerateOptions,
    ) -> Result<Generation>;
}
