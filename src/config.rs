use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

/// Which persistence backend the process runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "document" => Ok(StorageBackend::Memory),
            other => Err(Error::Config(format!(
                "Unknown STORAGE_BACKEND: {} (expected postgres or memory)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub imgbb_api_key: String,
    pub imgbb_endpoint: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: Option<String>,
    pub hr_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let storage_backend: StorageBackend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(Error::Config(
                "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_string(),
            ));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            storage_backend,
            database_url,
            imgbb_api_key: get_env("IMGBB_API_KEY")?,
            imgbb_endpoint: env::var("IMGBB_ENDPOINT")
                .unwrap_or_else(|_| "https://api.imgbb.com/1/upload".to_string()),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok(),
            mail_from: env::var("MAIL_FROM").ok(),
            hr_email: env::var("HR_EMAIL").unwrap_or_else(|_| "hr@company.com".to_string()),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}
