#[cfg(test)]
mod tests {
    use blvd::parser::{parse_http_request, ParseError};

    #[test]
    fn test_well_formed_request() {
        let raw = "GET /api/users HTTP/1.1\nHost: api.example.com\nUser-Agent: X\nAccept: application/json\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.method, "GET");
        assert_eq!(parsed.path, "/api/users");
        assert_eq!(parsed.host, "api.example.com");
        assert_eq!(parsed.url, "http://api.example.com/api/users");
        assert_eq!(parsed.body, "");
        assert_eq!(parsed.headers.len(), 3);
        assert!(parsed.graphql_operation.is_none());
        assert!(parsed.graphql_query.is_none());
    }

    #[test]
    fn test_https_detected_from_raw_text() {
        // No :443 in the Host header; the Referer value alone forces https
        let raw = "GET /login HTTP/1.1\nHost: example.com\nReferer: HTTPS://example.com/start\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.url, "https://example.com/login");
    }

    #[test]
    fn test_https_detected_from_host_port() {
        let raw = "POST /submit HTTP/1.1\nHost: example.com:443\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.url, "https://example.com:443/submit");
    }

    #[test]
    fn test_duplicate_header_last_wins() {
        let raw = "GET / HTTP/1.1\nX-Token: first\nHost: a.example.com\nX-Token: second\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.headers["X-Token"], "second");
        // Overwriting keeps the original position
        let keys: Vec<&String> = parsed.headers.keys().collect();
        assert_eq!(keys, vec!["X-Token", "Host"]);
    }

    #[test]
    fn test_header_value_splits_on_first_colon_only() {
        let raw = "GET / HTTP/1.1\nHost: example.com:8080\nReferer: https://example.com/a\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.host, "example.com:8080");
        assert_eq!(parsed.headers["Referer"], "https://example.com/a");
    }

    #[test]
    fn test_graphql_extraction() {
        let body = r#"{"operationName":"GetUser","query":"query GetUser { user { id } }"}"#;
        let raw = format!(
            "POST /graphql HTTP/1.1\nHost: api.example.com\nContent-Type: application/json\n\n{}",
            body
        );
        let parsed = parse_http_request(&raw).unwrap();

        assert_eq!(parsed.graphql_operation.as_deref(), Some("GetUser"));
        assert_eq!(
            parsed.graphql_query.as_deref(),
            Some("query GetUser { user { id } }")
        );
        assert_eq!(parsed.body, body);
    }

    #[test]
    fn test_non_json_graphql_body_is_ignored() {
        let raw = "POST /graphql HTTP/1.1\nHost: api.example.com\n\nmutation this is not json";
        let parsed = parse_http_request(raw).unwrap();

        assert!(parsed.graphql_operation.is_none());
        assert!(parsed.graphql_query.is_none());
        assert_eq!(parsed.body, "mutation this is not json");
    }

    #[test]
    fn test_invalid_request_line_fails() {
        let result = parse_http_request("not a valid request line");
        assert_eq!(result.unwrap_err(), ParseError::InvalidRequestLine);
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(parse_http_request("   \n  ").unwrap_err(), ParseError::Empty);
    }

    // Header keys are stored case-sensitively and the host lookup uses the
    // literal capitalization "Host"; a lowercase header is invisible to it.
    #[test]
    fn lowercase_host_is_not_extracted() {
        let raw = "GET /x HTTP/1.1\nhost: example.com\n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.host, "");
        assert_eq!(parsed.url, "http:///x");
        assert_eq!(parsed.headers["host"], "example.com");
    }

    #[test]
    fn test_missing_blank_line_means_empty_body() {
        let raw = "GET / HTTP/1.1\nHost: example.com\nAccept: */*";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.body, "");
        assert_eq!(parsed.headers.len(), 2);
    }

    #[test]
    fn test_body_is_joined_and_trimmed() {
        let raw = "POST /form HTTP/1.1\nHost: example.com\n\n  line one\nline two  \n\n";
        let parsed = parse_http_request(raw).unwrap();

        assert_eq!(parsed.body, "line one\nline two");
    }

    #[test]
    fn test_header_order_survives_serialization() {
        let raw = "GET / HTTP/1.1\nZebra: 1\nAlpha: 2\nHost: example.com\n\n";
        let parsed = parse_http_request(raw).unwrap();

        let json = serde_json::to_string(&parsed.headers).unwrap();
        let zebra = json.find("Zebra").unwrap();
        let alpha = json.find("Alpha").unwrap();
        let host = json.find("Host").unwrap();
        assert!(zebra < alpha && alpha < host);
    }
}
