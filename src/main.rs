use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use blvd::chat::ChatRelay;
use blvd::cli::{
    commands::{Cli, Commands},
    run_cli,
};
use blvd::config::AppConfig;
use blvd::db;
use blvd::llm::AnthropicFactory;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}

async fn index() -> impl Responder {
    let html = include_str!("../static/chat.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn mindset() -> impl Responder {
    let html = include_str!("../static/mindset.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn burp_parser() -> impl Responder {
    let html = include_str!("../static/burp_parser.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

async fn rules() -> impl Responder {
    let html = include_str!("../static/rules.html");
    HttpResponse::Ok().content_type("text/html").body(html)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Serve) {
        run_cli(cli.command, cli.config).await;
        return Ok(());
    }

    info!("Starting BLV Dashboard Server...");

    let config = match AppConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_pool = match db::get_connection(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let relay = ChatRelay::new(db_pool.clone(), Arc::new(AnthropicFactory));

    let host = config.server.host.clone();
    let port = config.server.port;

    info!("Server listening on {}:{}", host, port);

    let relay = web::Data::new(relay);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(relay.clone())
            .route("/", web::get().to(index))
            .route("/mindset", web::get().to(mindset))
            .route("/burp-parser", web::get().to(burp_parser))
            .route("/rules", web::get().to(rules))
            .route("/health", web::get().to(health))
            .configure(blvd::api::routes::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
