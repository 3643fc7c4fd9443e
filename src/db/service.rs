use crate::db::models::{Conversation, HttpRequest, Message};
use crate::parser::ParsedHttpRequest;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, Result as DbResult, Row};

pub struct DbService;

// DuckDB hands timestamps back in "YYYY-MM-DD HH:MM:SS[.ffffff]" form when
// CAST to VARCHAR, which chrono's RFC 3339 parser rejects. Queries therefore
// always CAST timestamps to VARCHAR and go through this helper.
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

impl DbService {
    fn row_to_conversation(row: &Row) -> DbResult<Conversation> {
        Ok(Conversation {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: parse_timestamp(&row.get::<_, String>(2)?),
            updated_at: parse_timestamp(&row.get::<_, String>(3)?),
        })
    }

    fn row_to_message(row: &Row) -> DbResult<Message> {
        Ok(Message {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            created_at: parse_timestamp(&row.get::<_, String>(4)?),
        })
    }

    fn row_to_http_request(row: &Row) -> DbResult<HttpRequest> {
        Ok(HttpRequest {
            id: row.get(0)?,
            raw_request: row.get(1)?,
            method: row.get(2)?,
            url: row.get(3)?,
            host: row.get(4)?,
            path: row.get(5)?,
            headers_json: row.get(6)?,
            body: row.get(7)?,
            graphql_operation: row.get(8)?,
            graphql_query: row.get(9)?,
            parsed_at: parse_timestamp(&row.get::<_, String>(10)?),
        })
    }

    // --- Settings ---

    pub fn get_setting(conn: &Connection, key: &str) -> DbResult<Option<String>> {
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?")?;
        let mut rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;

        match rows.next() {
            Some(value) => Ok(Some(value?)),
            None => Ok(None),
        }
    }

    pub fn set_setting(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Conversations ---

    pub fn insert_conversation(conn: &Connection, title: &str) -> DbResult<Conversation> {
        conn.execute(
            "INSERT INTO conversations (title) VALUES (?)",
            params![title],
        )?;

        // The id comes from a sequence, so re-select the row we just wrote
        let mut stmt = conn.prepare(
            "SELECT id, title, CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)
             FROM conversations
             ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], Self::row_to_conversation)?;

        rows.next().unwrap()
    }

    pub fn get_conversation(conn: &Connection, id: i64) -> DbResult<Option<Conversation>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)
             FROM conversations WHERE id = ?",
        )?;
        let mut rows = stmt.query_map(params![id], Self::row_to_conversation)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_conversations(conn: &Connection) -> DbResult<Vec<Conversation>> {
        let mut stmt = conn.prepare(
            "SELECT id, title, CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)
             FROM conversations
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], Self::row_to_conversation)?;

        let mut conversations = Vec::new();
        for row in rows {
            conversations.push(row?);
        }
        Ok(conversations)
    }

    pub fn rename_conversation(conn: &Connection, id: i64, title: &str) -> DbResult<()> {
        conn.execute(
            "UPDATE conversations SET title = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![title, id],
        )?;
        Ok(())
    }

    pub fn delete_conversation(conn: &Connection, id: i64) -> DbResult<()> {
        conn.execute("BEGIN TRANSACTION", [])?;

        // Messages go first so a failure can never leave orphans behind
        if let Err(e) = conn.execute("DELETE FROM messages WHERE conversation_id = ?", params![id]) {
            let _ = conn.execute("ROLLBACK", []);
            return Err(e);
        }

        if let Err(e) = conn.execute("DELETE FROM conversations WHERE id = ?", params![id]) {
            let _ = conn.execute("ROLLBACK", []);
            return Err(e);
        }

        conn.execute("COMMIT", [])?;
        Ok(())
    }

    // --- Messages ---

    pub fn insert_message(
        conn: &Connection,
        conversation_id: i64,
        role: &str,
        content: &str,
    ) -> DbResult<Message> {
        conn.execute(
            "INSERT INTO messages (conversation_id, role, content) VALUES (?, ?, ?)",
            params![conversation_id, role, content],
        )?;

        conn.execute(
            "UPDATE conversations SET updated_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![conversation_id],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, CAST(created_at AS VARCHAR)
             FROM messages
             WHERE conversation_id = ?
             ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map(params![conversation_id], Self::row_to_message)?;

        rows.next().unwrap()
    }

    pub fn get_messages(conn: &Connection, conversation_id: i64) -> DbResult<Vec<Message>> {
        let mut stmt = conn.prepare(
            "SELECT id, conversation_id, role, content, CAST(created_at AS VARCHAR)
             FROM messages
             WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![conversation_id], Self::row_to_message)?;

        let mut messages = Vec::new();
        for row in rows {
            messages.push(row?);
        }
        Ok(messages)
    }

    // --- HTTP request archive ---

    pub fn insert_http_request(
        conn: &Connection,
        parsed: &ParsedHttpRequest,
        raw_request: &str,
    ) -> DbResult<HttpRequest> {
        let headers_json =
            serde_json::to_string(&parsed.headers).unwrap_or_else(|_| "{}".to_string());

        conn.execute(
            "INSERT INTO http_requests
                (raw_request, method, url, host, path, headers_json, body, graphql_operation, graphql_query)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                raw_request,
                parsed.method,
                parsed.url,
                parsed.host,
                parsed.path,
                headers_json,
                parsed.body,
                parsed.graphql_operation,
                parsed.graphql_query,
            ],
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, raw_request, method, url, host, path, headers_json, body,
                    graphql_operation, graphql_query, CAST(parsed_at AS VARCHAR)
             FROM http_requests
             ORDER BY id DESC LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], Self::row_to_http_request)?;

        rows.next().unwrap()
    }

    pub fn get_http_request(conn: &Connection, id: i64) -> DbResult<Option<HttpRequest>> {
        let mut stmt = conn.prepare(
            "SELECT id, raw_request, method, url, host, path, headers_json, body,
                    graphql_operation, graphql_query, CAST(parsed_at AS VARCHAR)
             FROM http_requests WHERE id = ?",
        )?;
        let mut rows = stmt.query_map(params![id], Self::row_to_http_request)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_http_requests(conn: &Connection, limit: usize) -> DbResult<Vec<HttpRequest>> {
        let mut stmt = conn.prepare(
            "SELECT id, raw_request, method, url, host, path, headers_json, body,
                    graphql_operation, graphql_query, CAST(parsed_at AS VARCHAR)
             FROM http_requests
             ORDER BY parsed_at DESC, id DESC
             LIMIT ?",
        )?;
        let rows = stmt.query_map(params![limit as i64], Self::row_to_http_request)?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        Ok(requests)
    }
}
