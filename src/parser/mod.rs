use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("request text is empty")]
    Empty,
    #[error("request line does not look like an HTTP request")]
    InvalidRequestLine,
}

/// Structured form of a raw HTTP request pasted from an intercepting proxy.
///
/// Header names keep their insertion order and original casing; a duplicate
/// name overwrites the earlier value in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedHttpRequest {
    pub method: String,
    pub url: String,
    pub host: String,
    pub path: String,
    pub headers: Map<String, Value>,
    pub body: String,
    pub graphql_operation: Option<String>,
    pub graphql_query: Option<String>,
}

fn request_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\s+(.+?)\s+HTTP/[\d.]+").unwrap())
}

/// Best-effort parse of raw HTTP request text. Only a malformed request line
/// is fatal; missing headers, an absent body, or a body that fails GraphQL
/// sniffing all degrade to empty/absent fields.
pub fn parse_http_request(raw_request: &str) -> Result<ParsedHttpRequest, ParseError> {
    let trimmed = raw_request.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let lines: Vec<&str> = trimmed.split('\n').collect();

    let request_line = lines[0].trim();
    let caps = request_line_re()
        .captures(request_line)
        .ok_or(ParseError::InvalidRequestLine)?;

    let method = caps[1].to_string();
    let path = caps[2].to_string();

    let mut headers = Map::new();
    let mut body_start = 0usize;

    for (i, line) in lines.iter().enumerate().skip(1) {
        let line = line.trim();

        if line.is_empty() {
            // Empty line = end of headers
            body_start = i + 1;
            break;
        }

        // Split on the first colon only; values may contain more of them
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(
                key.trim().to_string(),
                Value::String(value.trim().to_string()),
            );
        }
    }

    let host = headers
        .get("Host")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let protocol = if raw_request.to_lowercase().contains("https://") || host.contains(":443") {
        "https"
    } else {
        "http"
    };
    let url = format!("{}://{}{}", protocol, host, path);

    let body = if body_start > 0 {
        lines[body_start..].join("\n").trim().to_string()
    } else {
        String::new()
    };

    // GraphQL sniffing is a substring heuristic, not a content-type check.
    // A body that merely mentions `query` but isn't JSON is left alone.
    let mut graphql_operation = None;
    let mut graphql_query = None;

    if !body.is_empty() && (body.contains("query") || body.contains("mutation")) {
        if let Ok(body_json) = serde_json::from_str::<Value>(&body) {
            graphql_operation = body_json
                .get("operationName")
                .and_then(Value::as_str)
                .map(String::from);
            graphql_query = body_json
                .get("query")
                .and_then(Value::as_str)
                .map(String::from);
        }
    }

    Ok(ParsedHttpRequest {
        method,
        url,
        host,
        path,
        headers,
        body,
        graphql_operation,
        graphql_query,
    })
}
