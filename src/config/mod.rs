use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got `{value}`")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    pub fetch_timeout: Duration,
    /// Prefix the percent-encoded target is appended to, e.g.
    /// `https://proxy.example/raw?url=`. Unset means fetch directly.
    pub fetch_proxy_url: Option<String>,
    pub block_private_hosts: bool,
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port: u16 = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "SERVER_PORT",
                expected: "a port number",
                value: raw,
            })?,
            None => 8080,
        };

        let fetch_timeout_secs: u64 = match lookup("FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.parse() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "FETCH_TIMEOUT_SECS",
                        expected: "a positive number of seconds",
                        value: raw,
                    })
                }
            },
            None => 10,
        };

        let block_private_hosts = match lookup("BLOCK_PRIVATE_HOSTS") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                var: "BLOCK_PRIVATE_HOSTS",
                expected: "true or false",
                value: raw,
            })?,
            None => true,
        };

        Ok(Config {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port,
            is_dev: lookup("APP_ENV").as_deref() != Some("production"),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            fetch_proxy_url: lookup("FETCH_PROXY_URL").filter(|s| !s.trim().is_empty()),
            block_private_hosts,
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    /// Production logs are emitted as JSON.
    pub fn json_logs(&self) -> bool {
        !self.is_dev
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
