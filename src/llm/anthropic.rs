use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::json;
use tokio::sync::mpsc::Sender;

use crate::llm::{
    models::{ChatOptions, Message},
    LlmError, LlmProvider, DEFAULT_MAX_TOKENS,
};

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat_streaming(
        &self,
        messages: &[Message],
        options: ChatOptions,
        tx: Sender<String>,
    ) -> Result<(), LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        // 'system' is a top-level field on the Messages API, not a role
        let mut body = json!({
            "model": model,
            "messages": messages,
            "stream": true,
            "max_tokens": options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(system) = &options.system_prompt {
            body["system"] = json!(system.trim());
        }
        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(LlmError::RateLimited);
            }
            return Err(LlmError::Api(format!("Anthropic Error {}: {}", status, text)));
        }

        let mut stream = response.bytes_stream();

        // SSE lines can be split across network chunks, so carry the tail of
        // each chunk over to the next one instead of parsing chunk-by-chunk.
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let bytes = chunk.map_err(|e| LlmError::Network(e.to_string()))?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);

                if line.is_empty() {
                    continue;
                }
                let Some(data) = line.strip_prefix("data: ") else {
                    continue;
                };
                let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
                    continue;
                };

                match event["type"].as_str() {
                    Some("content_block_delta") => {
                        if let Some(text) = event["delta"]["text"].as_str() {
                            if tx.send(text.to_string()).await.is_err() {
                                // Receiver gone; stop reading the wire
                                return Ok(());
                            }
                        }
                    }
                    Some("error") => {
                        let message = event["error"]["message"]
                            .as_str()
                            .unwrap_or("unknown stream error");
                        return Err(LlmError::Api(message.to_string()));
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
