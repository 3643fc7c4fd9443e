use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub id: i64,
    pub raw_request: String,
    pub method: String,
    pub url: String,
    pub host: String,
    pub path: String,
    pub headers_json: String,
    pub body: String,
    pub graphql_operation: Option<String>,
    pub graphql_query: Option<String>,
    pub parsed_at: DateTime<Utc>,
}
