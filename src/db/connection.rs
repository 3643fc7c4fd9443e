use crate::config::DatabaseConfig;
use duckdb::{Connection, Result as DbResult};
use std::sync::{Arc, Mutex};
use tracing::info;

pub type DbPool = Arc<Mutex<Connection>>;

const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_conversations_id;
CREATE SEQUENCE IF NOT EXISTS seq_messages_id;
CREATE SEQUENCE IF NOT EXISTS seq_http_requests_id;

CREATE TABLE IF NOT EXISTS settings (
    key VARCHAR PRIMARY KEY,
    value TEXT,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS conversations (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_conversations_id'),
    title VARCHAR NOT NULL DEFAULT 'New Conversation',
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS messages (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_messages_id'),
    conversation_id BIGINT NOT NULL,
    role VARCHAR NOT NULL,
    content TEXT NOT NULL,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS http_requests (
    id BIGINT PRIMARY KEY DEFAULT nextval('seq_http_requests_id'),
    raw_request TEXT NOT NULL,
    method VARCHAR,
    url VARCHAR,
    host VARCHAR,
    path VARCHAR,
    headers_json TEXT,
    body TEXT,
    graphql_operation VARCHAR,
    graphql_query VARCHAR,
    parsed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, created_at);
CREATE INDEX IF NOT EXISTS idx_conversations_created ON conversations(created_at);
CREATE INDEX IF NOT EXISTS idx_http_requests_parsed ON http_requests(parsed_at);

INSERT OR IGNORE INTO settings (key, value) VALUES
    ('system_prompt', 'You are a helpful security research assistant specialized in analyzing business logic vulnerabilities. Focus on economic exploits, workflow bypasses, temporal attacks, and privilege escalation.'),
    ('claude_api_key', ''),
    ('rules', '');
"#;

pub fn get_connection(config: &DatabaseConfig) -> DbResult<DbPool> {
    info!("Connecting to DuckDB at {}", config.path);
    let conn = Connection::open(&config.path)?;

    init_schema(&conn)?;

    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_schema(conn: &Connection) -> DbResult<()> {
    info!("Initializing database schema");
    conn.execute_batch(SCHEMA)?;
    Ok(())
}
