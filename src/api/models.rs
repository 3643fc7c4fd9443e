use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiKeyRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
pub struct SystemPromptRequest {
    #[serde(default)]
    pub system_prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct RulesRequest {
    #[serde(default)]
    pub rules: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameConversationRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub conversation_id: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ParseBurpRequest {
    #[serde(default)]
    pub raw_request: String,
}

#[derive(Debug, Deserialize)]
pub struct BurpListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}
