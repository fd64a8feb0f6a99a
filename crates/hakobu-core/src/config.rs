//! Configuration module
//!
//! Environment-driven configuration for the API server, database, auth
//! tokens, upload limits, and the external document-understanding service.

use std::env;

use crate::error::AppError;

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;
const DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS: i64 = 30;
/// Upload cap, 10 MB.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const DEFAULT_EXTRACTION_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_EXTRACTION_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_EXTRACTION_MAX_TOKENS: u32 = 1000;

/// Application configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    environment: String,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    jwt_secret: String,
    access_token_expiry_hours: i64,
    refresh_token_expiry_days: i64,
    max_upload_bytes: usize,
    extraction_api_url: String,
    extraction_api_key: Option<String>,
    extraction_model: String,
    extraction_max_tokens: u32,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from the environment (and `.env` when present).
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL is not set".to_string()))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Configuration("JWT_SECRET is not set".to_string()))?;
        if jwt_secret.len() < 32 {
            return Err(AppError::Configuration(
                "JWT_SECRET must be at least 32 characters".to_string(),
            ));
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let extraction_api_key = env::var("EXTRACTION_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            server_port: env_or("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", DEFAULT_CONNECTION_TIMEOUT_SECS),
            jwt_secret,
            access_token_expiry_hours: env_or(
                "ACCESS_TOKEN_EXPIRY_HOURS",
                DEFAULT_ACCESS_TOKEN_EXPIRY_HOURS,
            ),
            refresh_token_expiry_days: env_or(
                "REFRESH_TOKEN_EXPIRY_DAYS",
                DEFAULT_REFRESH_TOKEN_EXPIRY_DAYS,
            ),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            extraction_api_url: env::var("EXTRACTION_API_URL")
                .unwrap_or_else(|_| DEFAULT_EXTRACTION_API_URL.to_string()),
            extraction_api_key,
            extraction_model: env::var("EXTRACTION_MODEL")
                .unwrap_or_else(|_| DEFAULT_EXTRACTION_MODEL.to_string()),
            extraction_max_tokens: env_or("EXTRACTION_MAX_TOKENS", DEFAULT_EXTRACTION_MAX_TOKENS),
        })
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    pub fn access_token_expiry_hours(&self) -> i64 {
        self.access_token_expiry_hours
    }

    pub fn refresh_token_expiry_days(&self) -> i64 {
        self.refresh_token_expiry_days
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    pub fn extraction_api_url(&self) -> &str {
        &self.extraction_api_url
    }

    /// API key for the document-understanding service. `None` means the
    /// extraction endpoints will refuse with a configuration error.
    pub fn extraction_api_key(&self) -> Option<&str> {
        self.extraction_api_key.as_deref()
    }

    pub fn extraction_model(&self) -> &str {
        &self.extraction_model
    }

    pub fn extraction_max_tokens(&self) -> u32 {
        self.extraction_max_tokens
    }

    /// Construction hook for tests; avoids threading env vars through test code.
    #[allow(clippy::too_many_arguments)]
    pub fn for_tests(database_url: String, jwt_secret: String) -> Self {
        Self {
            server_port: 0,
            cors_origins: Vec::new(),
            environment: "test".to_string(),
            database_url,
            db_max_connections: 2,
            db_timeout_seconds: 5,
            jwt_secret,
            access_token_expiry_hours: 1,
            refresh_token_expiry_days: 1,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            extraction_api_url: DEFAULT_EXTRACTION_API_URL.to_string(),
            extraction_api_key: None,
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            extraction_max_tokens: DEFAULT_EXTRACTION_MAX_TOKENS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_tests_defaults() {
        let config = Config::for_tests(
            "postgres://localhost/hakobu_test".to_string(),
            "0123456789abcdef0123456789abcdef".to_string(),
        );
        assert!(!config.is_production());
        assert_eq!(config.max_upload_bytes(), 10 * 1024 * 1024);
        assert!(config.extraction_api_key().is_none());
        assert_eq!(config.extraction_max_tokens(), 1000);
    }
}
