// src/config.rs
//! Process configuration, read once from the environment at startup.
//!
//! A missing `MEM_API_KEY` is a warning, not a hard failure — the server
//! still answers health/info and MCP introspection; tool calls that need
//! the credential fail per-call instead.

use crate::mem::client::ApiGeneration;

/// Environment-derived configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Mem API credential. `None` when `MEM_API_KEY` is unset.
    pub api_key: Option<String>,
    /// Base URL of the Mem API.
    pub api_url: String,
    /// Which auth scheme generation to use against the Mem API.
    pub generation: ApiGeneration,
    /// Listen port.
    pub port: u16,
    /// CORS allow-list. `None` = unrestricted.
    pub allowed_origins: Option<Vec<String>>,
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = std::env::var("MEM_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "MEM_API_KEY not set — tool calls against the Mem API will fail until configured"
            );
        }

        let api_url = std::env::var("MEM_API_URL")
            .ok()
            .filter(|u| !u.is_empty())
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.mem.ai".to_string());

        let generation = match std::env::var("MEM_API_VERSION").as_deref() {
            Ok("v0") => ApiGeneration::V0,
            Ok("v1") | Err(_) => ApiGeneration::V1,
            Ok(other) => {
                tracing::warn!("Unknown MEM_API_VERSION '{}' — defaulting to v1", other);
                ApiGeneration::V1
            }
        };

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS").ok().and_then(|raw| {
            let list: Vec<String> = raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
            if list.is_empty() { None } else { Some(list) }
        });

        Self {
            api_key,
            api_url,
            generation,
            port,
            allowed_origins,
        }
    }
}
