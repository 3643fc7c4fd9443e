#[cfg(test)]
mod tests {
    use blvd::db::connection::init_schema;
    use blvd::db::service::DbService;
    use blvd::parser::parse_http_request;

    fn get_test_db() -> duckdb::Connection {
        let conn = duckdb::Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_default_settings_seeded() {
        let conn = get_test_db();

        let prompt = DbService::get_setting(&conn, "system_prompt").unwrap().unwrap();
        assert!(prompt.contains("business logic"));
        assert_eq!(DbService::get_setting(&conn, "claude_api_key").unwrap(), Some("".to_string()));
        assert_eq!(DbService::get_setting(&conn, "rules").unwrap(), Some("".to_string()));
        assert_eq!(DbService::get_setting(&conn, "nonexistent").unwrap(), None);
    }

    #[test]
    fn test_settings_upsert_idempotence() {
        let conn = get_test_db();

        DbService::set_setting(&conn, "claude_api_key", "v1").unwrap();
        DbService::set_setting(&conn, "claude_api_key", "v2").unwrap();

        assert_eq!(
            DbService::get_setting(&conn, "claude_api_key").unwrap(),
            Some("v2".to_string())
        );

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM settings WHERE key = 'claude_api_key'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_conversation_lifecycle() {
        let conn = get_test_db();

        let conversation = DbService::insert_conversation(&conn, "Recon").unwrap();
        assert_eq!(conversation.title, "Recon");

        let fetched = DbService::get_conversation(&conn, conversation.id).unwrap().unwrap();
        assert_eq!(fetched.id, conversation.id);

        DbService::rename_conversation(&conn, conversation.id, "Checkout flow").unwrap();
        let renamed = DbService::get_conversation(&conn, conversation.id).unwrap().unwrap();
        assert_eq!(renamed.title, "Checkout flow");

        let list = DbService::list_conversations(&conn).unwrap();
        assert_eq!(list.len(), 1);

        DbService::delete_conversation(&conn, conversation.id).unwrap();
        assert!(DbService::get_conversation(&conn, conversation.id).unwrap().is_none());
    }

    #[test]
    fn test_conversation_ids_are_monotonic() {
        let conn = get_test_db();

        let first = DbService::insert_conversation(&conn, "a").unwrap();
        let second = DbService::insert_conversation(&conn, "b").unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn test_message_ordering_and_cascade_delete() {
        let conn = get_test_db();
        let conversation = DbService::insert_conversation(&conn, "Target").unwrap();

        let msg1 = DbService::insert_message(&conn, conversation.id, "user", "Hello!").unwrap();
        let msg2 = DbService::insert_message(&conn, conversation.id, "assistant", "Hi.").unwrap();

        assert_eq!(msg1.conversation_id, conversation.id);
        assert_eq!(msg2.role, "assistant");

        let history = DbService::get_messages(&conn, conversation.id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, "user");
        assert_eq!(history[1].role, "assistant");

        DbService::delete_conversation(&conn, conversation.id).unwrap();
        let empty = DbService::get_messages(&conn, conversation.id).unwrap();
        assert_eq!(empty.len(), 0);

        let orphans: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ?",
                duckdb::params![conversation.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_http_request_archive() {
        let conn = get_test_db();

        let raw = "GET /api/users HTTP/1.1\nHost: api.example.com\n\n";
        let parsed = parse_http_request(raw).unwrap();

        let stored = DbService::insert_http_request(&conn, &parsed, raw).unwrap();
        assert_eq!(stored.method, "GET");
        assert_eq!(stored.url, "http://api.example.com/api/users");
        assert_eq!(stored.raw_request, raw);
        assert!(stored.headers_json.contains("api.example.com"));

        let fetched = DbService::get_http_request(&conn, stored.id).unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert!(DbService::get_http_request(&conn, stored.id + 1).unwrap().is_none());
    }

    #[test]
    fn test_http_request_listing_is_newest_first() {
        let conn = get_test_db();

        let first = parse_http_request("GET /one HTTP/1.1\nHost: a\n\n").unwrap();
        let second = parse_http_request("GET /two HTTP/1.1\nHost: a\n\n").unwrap();
        let first = DbService::insert_http_request(&conn, &first, "GET /one HTTP/1.1").unwrap();
        let second = DbService::insert_http_request(&conn, &second, "GET /two HTTP/1.1").unwrap();

        let listed = DbService::list_http_requests(&conn, 50).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let limited = DbService::list_http_requests(&conn, 1).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second.id);
    }
}
