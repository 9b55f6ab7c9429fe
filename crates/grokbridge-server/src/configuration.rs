use config::Config;
use grokbridge::config::apply_env_overrides;
use grokbridge::errors::ConfigError;
use serde::Deserialize;
use std::time::Duration;

/// Environment variables read by the proxy, in the order they are applied
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("GROK_BASE_URL", "proxy.upstream_url"),
    ("MCP_API_KEY", "proxy.api_key"),
    ("PROXY_TIMEOUT", "proxy.timeout"),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxySettings {
    pub upstream_url: String,
    /// Token every proxied request must present. Empty rejects everything.
    pub api_key: String,
    /// Seconds
    pub timeout: u64,
}

impl ProxySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub proxy: ProxySettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(|name| std::env::var(name).ok())
    }

    pub fn load<F>(env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8001i64)?
            .set_default("proxy.upstream_url", "http://localhost:8000")?
            .set_default("proxy.api_key", "")?
            .set_default("proxy.timeout", 120i64)?;

        let config = apply_env_overrides(builder, ENV_OVERRIDES, &env)?.build()?;
        Ok(config.try_deserialize()?)
    }
}
