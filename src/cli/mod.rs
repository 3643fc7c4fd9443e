pub mod commands;

use std::io::{self, Write};
use std::sync::Arc;

use crate::chat::{ChatEvent, ChatRelay};
use crate::cli::commands::{Commands, ConversationAction};
use crate::config::AppConfig;
use crate::db::{get_connection, service::DbService};
use crate::llm::AnthropicFactory;

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    match command {
        Commands::Serve => {
            panic!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Conversation { action } => {
            let pool = get_connection(&config.database).expect("DB error");
            let conn = pool.lock().unwrap();

            match action {
                ConversationAction::Create { title } => {
                    match DbService::insert_conversation(&conn, &title) {
                        Ok(c) => println!("Created Conversation: {} (#{})", c.title, c.id),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                ConversationAction::List => match DbService::list_conversations(&conn) {
                    Ok(conversations) => {
                        if conversations.is_empty() {
                            println!("No conversations found.");
                        } else {
                            println!("{:<8} | {:<20} | {}", "ID", "Created At", "Title");
                            println!("{:-<8}-+-{:-<20}-+-{:-<20}", "", "", "");
                            for c in conversations {
                                println!("{:<8} | {:<20} | {}", c.id, c.created_at, c.title);
                            }
                        }
                    }
                    Err(e) => eprintln!("Error: {}", e),
                },
                ConversationAction::Delete { id } => {
                    match DbService::delete_conversation(&conn, id) {
                        Ok(_) => println!("Deleted conversation {}", id),
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                ConversationAction::Export { id, path } => {
                    let conversation = match DbService::get_conversation(&conn, id) {
                        Ok(Some(c)) => c,
                        _ => {
                            eprintln!("Conversation {} not found.", id);
                            return;
                        }
                    };
                    let messages = DbService::get_messages(&conn, id).unwrap_or_default();

                    let export_path = path.unwrap_or_else(|| format!("conversation_{}.txt", id));
                    let mut file =
                        std::fs::File::create(&export_path).expect("Failed to create file");

                    writeln!(file, "Conversation: {}", conversation.title).unwrap();
                    writeln!(file, "ID: {}", conversation.id).unwrap();
                    writeln!(file, "Created At: {}", conversation.created_at).unwrap();
                    writeln!(file, "---").unwrap();

                    for m in messages {
                        writeln!(file, "[{}]: {}", m.role.to_uppercase(), m.content).unwrap();
                        writeln!(file, "---").unwrap();
                    }

                    println!("Conversation exported successfully to: {}", export_path);
                }
            }
        }
        Commands::Chat { conversation } => {
            run_repl(conversation, config).await;
        }
    }
}

async fn run_repl(conversation_id: i64, config: AppConfig) {
    let pool = get_connection(&config.database).expect("DB Error");

    let conversation_exists = {
        let conn = pool.lock().unwrap();
        DbService::get_conversation(&conn, conversation_id)
            .unwrap_or(None)
            .is_some()
    };

    if !conversation_exists {
        eprintln!("Conversation {} not found.", conversation_id);
        return;
    }

    let relay = ChatRelay::new(pool, Arc::new(AnthropicFactory));

    println!("--- BLV Dashboard Terminal Chat ---");
    println!("Connected to Conversation: {}", conversation_id);
    println!("Type /exit to quit.");
    println!("-----------------------------------");

    loop {
        print!("\nUser> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        let mut rx = match relay.open(conversation_id, text) {
            Ok(rx) => rx,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        print!("Assistant> ");
        io::stdout().flush().unwrap();

        while let Some(event) = rx.recv().await {
            match event {
                ChatEvent::Chunk(chunk) => {
                    print!("{}", chunk);
                    io::stdout().flush().unwrap();
                }
                ChatEvent::Done => break,
                ChatEvent::Error(message) => {
                    eprintln!("\n[error] {}", message);
                    break;
                }
            }
        }
        println!();
    }
}
