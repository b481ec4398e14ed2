pub mod anthropic;
pub mod openai;
pub mod traits;

pub use anthropic::{Anthropic, DEFAULT_ANTHROPIC_MODEL};
pub use openai::{DEFAULT_OPENAI_MODEL, OpenAi};
pub use traits::{GenerateOptions, Generation, ResponseFormat, TextGenerator, TokenUsage};

use std::sync::Arc;

use anyhow::Result;

/// Build a generator from `AI_PROVIDER` and `AI_MODEL`.
///
/// `AI_PROVIDER` defaults to `anthropic`; any value other than `openai`
/// selects Anthropic. `AI_MODEL` overrides the per-provider default.
pub fn from_env() -> Result<Arc<dyn TextGenerator>> {
    let provider = std::env::var("AI_PROVIDER")
        .unwrap_or_else(|_| "anthropic".to_string())
        .to_lowercase();

    let generator: Arc<dyn TextGenerator> = if provider == "openai" {
        let model =
            std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());
        Arc::new(OpenAi::from_env(model)?)
    } else {
        let model =
            std::env::var("AI_MODEL").unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string());
        Arc::new(Anthropic::from_env(model)?)
    };

    Ok(generator)
}
