use actix_web::{delete, get, post, put, web, HttpResponse, Result as WebResult};
use bytes::Bytes;
use serde_json::json;

use crate::api::models::{
    ApiKeyRequest, BurpListQuery, ChatRequest, CreateConversationRequest, ParseBurpRequest,
    RenameConversationRequest, RulesRequest, SystemPromptRequest,
};
use crate::chat::{ChatRelay, RelayError};
use crate::db::{service::DbService, DbPool};
use crate::parser;

// --- Settings ---

#[get("/settings/api-key")]
pub async fn get_api_key(pool: web::Data<DbPool>) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::get_setting(&conn, "claude_api_key") {
        Ok(key) => {
            let key = key.unwrap_or_default();
            let masked = mask_api_key(&key);
            Ok(HttpResponse::Ok().json(json!({"api_key": masked, "is_set": !key.is_empty()})))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

// Leave short keys fully hidden; only long ones get a head/tail preview
fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 14 {
        let head: String = chars[..10].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        String::new()
    }
}

#[post("/settings/api-key")]
pub async fn set_api_key(
    pool: web::Data<DbPool>,
    req: web::Json<ApiKeyRequest>,
) -> WebResult<HttpResponse> {
    let api_key = req.api_key.trim();

    if api_key.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "API key required"})));
    }

    let conn = pool.lock().unwrap();
    match DbService::set_setting(&conn, "claude_api_key", api_key) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[get("/settings/system-prompt")]
pub async fn get_system_prompt(pool: web::Data<DbPool>) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::get_setting(&conn, "system_prompt") {
        Ok(prompt) => Ok(HttpResponse::Ok()
            .json(json!({"system_prompt": prompt.unwrap_or_default()}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[post("/settings/system-prompt")]
pub async fn set_system_prompt(
    pool: web::Data<DbPool>,
    req: web::Json<SystemPromptRequest>,
) -> WebResult<HttpResponse> {
    let prompt = req.system_prompt.trim();

    if prompt.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "System prompt required"})));
    }

    let conn = pool.lock().unwrap();
    match DbService::set_setting(&conn, "system_prompt", prompt) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[get("/settings/rules")]
pub async fn get_rules(pool: web::Data<DbPool>) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::get_setting(&conn, "rules") {
        Ok(rules) => Ok(HttpResponse::Ok().json(json!({"rules": rules.unwrap_or_default()}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[post("/settings/rules")]
pub async fn set_rules(
    pool: web::Data<DbPool>,
    req: web::Json<RulesRequest>,
) -> WebResult<HttpResponse> {
    // Rules may be cleared, so an empty value is allowed here
    let conn = pool.lock().unwrap();
    match DbService::set_setting(&conn, "rules", req.rules.trim()) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

// --- Conversations ---

#[get("/conversations")]
pub async fn list_conversations(pool: web::Data<DbPool>) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::list_conversations(&conn) {
        Ok(conversations) => Ok(HttpResponse::Ok().json(conversations)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[post("/conversations")]
pub async fn create_conversation(
    pool: web::Data<DbPool>,
    req: web::Json<CreateConversationRequest>,
) -> WebResult<HttpResponse> {
    let title = req
        .into_inner()
        .title
        .unwrap_or_else(|| "New Conversation".to_string());

    let conn = pool.lock().unwrap();
    match DbService::insert_conversation(&conn, &title) {
        Ok(conversation) => {
            Ok(HttpResponse::Ok().json(json!({"id": conversation.id, "title": conversation.title})))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[get("/conversations/{id}/messages")]
pub async fn conversation_messages(
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::get_messages(&conn, id.into_inner()) {
        Ok(messages) => Ok(HttpResponse::Ok().json(messages)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[put("/conversations/{id}")]
pub async fn rename_conversation(
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    req: web::Json<RenameConversationRequest>,
) -> WebResult<HttpResponse> {
    let title = req.title.trim();

    if title.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Title required"})));
    }

    let conn = pool.lock().unwrap();
    match DbService::rename_conversation(&conn, id.into_inner(), title) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[delete("/conversations/{id}")]
pub async fn delete_conversation(
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::delete_conversation(&conn, id.into_inner()) {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({"success": true}))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

// --- Chat ---

#[post("/chat")]
pub async fn chat(
    relay: web::Data<ChatRelay>,
    req: web::Json<ChatRequest>,
) -> WebResult<HttpResponse> {
    let req = req.into_inner();

    let mut rx = match relay.open(req.conversation_id, &req.message) {
        Ok(rx) => rx,
        Err(e @ (RelayError::EmptyMessage | RelayError::MissingApiKey)) => {
            return Ok(HttpResponse::BadRequest().json(json!({"error": e.to_string()})));
        }
        Err(e) => {
            return Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()})));
        }
    };

    let stream = async_stream::stream! {
        while let Some(event) = rx.recv().await {
            yield Ok::<Bytes, actix_web::Error>(Bytes::from(format!("data: {}\n\n", event.to_json())));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(stream))
}

// --- Burp parser ---

#[post("/burp/parse")]
pub async fn parse_burp_request(
    pool: web::Data<DbPool>,
    req: web::Json<ParseBurpRequest>,
) -> WebResult<HttpResponse> {
    let raw_request = req.raw_request.trim();

    if raw_request.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "Raw request required"})));
    }

    let parsed = match parser::parse_http_request(raw_request) {
        Ok(parsed) => parsed,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({"error": "Failed to parse request"})));
        }
    };

    let conn = pool.lock().unwrap();
    match DbService::insert_http_request(&conn, &parsed, raw_request) {
        Ok(stored) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "id": stored.id,
            "request": stored,
        }))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

#[get("/burp/requests")]
pub async fn list_burp_requests(
    pool: web::Data<DbPool>,
    query: web::Query<BurpListQuery>,
) -> WebResult<HttpResponse> {
    let conn = pool.lock().unwrap();

    match DbService::list_http_requests(&conn, query.limit) {
        Ok(requests) => Ok(HttpResponse::Ok().json(requests)),
        Err(e) => Ok(HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))),
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(get_api_key)
            .service(set_api_key)
            .service(get_system_prompt)
            .service(set_system_prompt)
            .service(get_rules)
            .service(set_rules)
            .service(list_conversations)
            .service(create_conversation)
            .service(conversation_messages)
            .service(rename_conversation)
            .service(delete_conversation)
            .service(chat)
            .service(parse_burp_request)
            .service(list_burp_requests),
    );
}
