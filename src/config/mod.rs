mod config;

pub use config::{AppConfig, DatabaseConfig, ServerConfig};
