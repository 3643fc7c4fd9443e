use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tracing::{error, info};

use crate::db::{service::DbService, DbPool};
use crate::llm::{
    models::{ChatOptions, Message as LlmMessage},
    LlmProvider, ProviderFactory, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
};

const STOPPED_MARKER: &str = "\n\n*[Response stopped by user]*";
const EVENT_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Message required")]
    EmptyMessage,
    #[error("API key not configured")]
    MissingApiKey,
    #[error("Database error: {0}")]
    Db(#[from] duckdb::Error),
}

/// One frame of relay output. Every frame serializes to a self-contained
/// JSON object, so a consumer can decode each one independently.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Chunk(String),
    Done,
    Error(String),
}

impl ChatEvent {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ChatEvent::Chunk(text) => json!({"chunk": text}),
            ChatEvent::Done => json!({"done": true}),
            ChatEvent::Error(message) => json!({"error": message}),
        }
    }
}

/// Streams one chat turn: persists the user message, replays conversation
/// history to the provider, forwards fragments to the caller, and persists
/// the assistant reply (whole on completion, partial if the caller walks
/// away mid-stream).
pub struct ChatRelay {
    pool: DbPool,
    factory: Arc<dyn ProviderFactory>,
}

impl ChatRelay {
    pub fn new(pool: DbPool, factory: Arc<dyn ProviderFactory>) -> Self {
        Self { pool, factory }
    }

    /// Validates preconditions, persists the user turn, and starts streaming.
    /// Precondition failures are returned synchronously before any write;
    /// once a receiver is handed back, all failures arrive as in-band
    /// `ChatEvent::Error` frames.
    pub fn open(
        &self,
        conversation_id: i64,
        user_text: &str,
    ) -> Result<Receiver<ChatEvent>, RelayError> {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let (api_key, history, system_prompt) = {
            let conn = self.pool.lock().unwrap();

            let api_key = match DbService::get_setting(&conn, "claude_api_key")? {
                Some(key) if !key.is_empty() => key,
                _ => return Err(RelayError::MissingApiKey),
            };

            // The user turn is written before the provider is contacted, so
            // the history sent downstream always includes it
            DbService::insert_message(&conn, conversation_id, "user", text)?;
            let history = DbService::get_messages(&conn, conversation_id)?;

            let mut system_prompt =
                DbService::get_setting(&conn, "system_prompt")?.unwrap_or_default();
            let rules = DbService::get_setting(&conn, "rules")?.unwrap_or_default();
            if !rules.is_empty() {
                system_prompt = format!("{}\n\n# RULES\n{}", system_prompt, rules);
            }

            (api_key, history, system_prompt)
        };

        let llm_messages: Vec<LlmMessage> = history
            .into_iter()
            .map(|m| LlmMessage {
                role: m.role,
                content: m.content,
            })
            .collect();

        let provider = self.factory.create(api_key);
        let (out_tx, out_rx) = mpsc::channel(EVENT_BUFFER);

        info!(
            "Streaming conversation {} via {}",
            conversation_id,
            provider.name()
        );

        tokio::spawn(run_stream(
            self.pool.clone(),
            provider,
            conversation_id,
            system_prompt,
            llm_messages,
            out_tx,
        ));

        Ok(out_rx)
    }
}

async fn run_stream(
    pool: DbPool,
    provider: Arc<dyn LlmProvider>,
    conversation_id: i64,
    system_prompt: String,
    history: Vec<LlmMessage>,
    out: Sender<ChatEvent>,
) {
    let (tx, mut rx) = mpsc::channel::<String>(100);

    let options = ChatOptions {
        model: Some(DEFAULT_MODEL.to_string()),
        max_tokens: Some(DEFAULT_MAX_TOKENS),
        system_prompt: Some(system_prompt),
        ..Default::default()
    };

    let provider_task = tokio::spawn(async move {
        provider.chat_streaming(&history, options, tx).await
    });

    let mut assistant_text = String::new();
    let mut cancelled = false;

    loop {
        tokio::select! {
            fragment = rx.recv() => match fragment {
                Some(chunk) => {
                    assistant_text.push_str(&chunk);
                    if out.send(ChatEvent::Chunk(chunk)).await.is_err() {
                        cancelled = true;
                        break;
                    }
                }
                None => break,
            },
            // The consumer dropped its receiver mid-stream
            _ = out.closed() => {
                cancelled = true;
                break;
            }
        }
    }

    if cancelled {
        // Release the upstream connection before touching the store
        provider_task.abort();

        if !assistant_text.trim().is_empty() {
            let conn = pool.lock().unwrap();
            let content = format!("{}{}", assistant_text, STOPPED_MARKER);
            if let Err(e) = DbService::insert_message(&conn, conversation_id, "assistant", &content)
            {
                error!("Failed to persist partial assistant message: {}", e);
            } else {
                info!(
                    "Client disconnected; saved partial response for conversation {}",
                    conversation_id
                );
            }
        }
        return;
    }

    match provider_task.await {
        Ok(Ok(())) => {
            let persisted = {
                let conn = pool.lock().unwrap();
                DbService::insert_message(&conn, conversation_id, "assistant", &assistant_text)
            };
            match persisted {
                Ok(_) => {
                    let _ = out.send(ChatEvent::Done).await;
                }
                Err(e) => {
                    error!("Failed to persist assistant message: {}", e);
                    let _ = out
                        .send(ChatEvent::Error(format!("Database error: {}", e)))
                        .await;
                }
            }
        }
        Ok(Err(e)) => {
            // Provider/network fault: report it, keep no partial transcript
            error!("LLM streaming error: {}", e);
            let _ = out.send(ChatEvent::Error(e.to_string())).await;
        }
        Err(e) => {
            error!("Streaming task panicked: {}", e);
            let _ = out
                .send(ChatEvent::Error("internal streaming failure".to_string()))
                .await;
        }
    }
}
