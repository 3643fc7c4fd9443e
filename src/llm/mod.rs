pub mod anthropic;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

use anthropic::AnthropicProvider;
use models::{ChatOptions, Message};

pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error: {0}")]
    Api(String),
    #[error("Rate Limited")]
    RateLimited,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Stream generated text fragments into `tx` until the provider is done.
    /// Returning `Ok(())` means the stream ended normally; the receiver side
    /// going away is not an error.
    async fn chat_streaming(
        &self,
        messages: &[Message],
        options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError>;
}

/// Builds a provider around an API key looked up at call time, since the key
/// lives in the settings store and can change while the server runs.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, api_key: String) -> Arc<dyn LlmProvider>;
}

pub struct AnthropicFactory;

impl ProviderFactory for AnthropicFactory {
    fn create(&self, api_key: String) -> Arc<dyn LlmProvider> {
        Arc::new(AnthropicProvider::new(
            api_key,
            ANTHROPIC_API_BASE.to_string(),
            DEFAULT_MODEL.to_string(),
        ))
    }
}
