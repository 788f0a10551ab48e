// Configuration module
// Centralized management of application configuration

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub port: u16,
}

impl AppConfig {
    /// Read configuration from the process environment. The API key is the
    /// only required variable; everything else has a sensible default.
    pub fn from_env() -> AppResult<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AppError::ConfigurationError(
                "Missing OPENAI_API_KEY in server environment.".to_string(),
            )
        })?;

        let openai_base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string());

        let port = match std::env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| {
                AppError::ConfigurationError(format!("Invalid PORT value: {}", value))
            })?,
            Err(_) => DEFAULT_PORT,
        };

        Ok(Self {
            openai_api_key,
            openai_base_url,
            port,
        })
    }
}
