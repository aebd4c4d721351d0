use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub database_path: String,
    pub uploads_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub jwt_secret: String,
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = env::var("DATABASE_PATH")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'DATABASE_PATH' is not set in your .env file.".to_string()
            ))?;

        let uploads_path = env::var("UPLOADS_PATH")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'UPLOADS_PATH' is not set in your .env file.".to_string()
            ))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'JWT_SECRET' is not set in your .env file.".to_string()
            ))?;

        // A short secret makes forged staff tokens feasible.
        if jwt_secret.len() < 32 {
            return Err(config::ConfigError::Message(
                "FATAL: 'JWT_SECRET' must be at least 32 characters long.".to_string()
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        if Path::new(&uploads_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'UPLOADS_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                uploads_path
            )));
        }

        let builder = config::Config::builder()
            // Base settings from the TOML file (web host/port).
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("uploads_path", uploads_path)?
            .set_override("jwt_secret", jwt_secret)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the document store file inside its own folder.
    pub fn documents_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("documents")
            .join("documents.db")
    }
}
