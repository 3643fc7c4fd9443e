use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("BLVD").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${BLVD_DB_FILE}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.database.path = expand_env(&app_config.database.path);

        Ok(app_config)
    }
}

fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_else(|_| "".to_string())
    } else {
        val.to_string()
    }
}
