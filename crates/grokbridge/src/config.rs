//! Layered settings: compiled defaults, then an optional TOML file, then a fixed
//! table of environment variables.
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::aggregator::StreamLimits;
use crate::errors::ConfigError;

pub const DEFAULT_SETTINGS_PATH: &str = "data/setting.toml";

/// Environment variables that override chat backend and global settings
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("API_KEY", "grok.api_key"),
    ("PROXY_URL", "grok.proxy_url"),
    ("BASE_URL", "global.base_url"),
    ("LOG_LEVEL", "global.log_level"),
];

/// Settings of the chat backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GrokSettings {
    pub api_key: String,
    pub proxy_url: String,
    pub default_model: String,
    pub default_video_model: String,
    pub stream_first_response_timeout: u64,
    pub stream_chunk_timeout: u64,
    pub stream_total_timeout: u64,
}

impl GrokSettings {
    pub fn api_key(&self) -> Option<&str> {
        Some(self.api_key.as_str()).filter(|key| !key.is_empty())
    }

    pub fn proxy_url(&self) -> Option<&str> {
        Some(self.proxy_url.as_str()).filter(|url| !url.is_empty())
    }

    pub fn stream_limits(&self) -> StreamLimits {
        StreamLimits {
            first_chunk: Duration::from_secs(self.stream_first_response_timeout),
            between_chunks: Duration::from_secs(self.stream_chunk_timeout),
            total: Duration::from_secs(self.stream_total_timeout),
        }
    }
}

/// Settings of the service as a whole
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalSettings {
    pub base_url: String,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub grok: GrokSettings,
    pub global: GlobalSettings,
}

impl Settings {
    /// Load from the default file location and the process environment
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Path::new(DEFAULT_SETTINGS_PATH), |name| {
            std::env::var(name).ok()
        })
    }

    /// Load settings from `path`, looking environment variables up through `env`.
    ///
    /// A missing file is fine. A file that cannot be read or parsed is logged and
    /// skipped, so the defaults and environment still apply.
    pub fn load<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = File::from(path).format(FileFormat::Toml).required(false);
        let with_file = defaults()
            .map(|builder| builder.add_source(file))
            .and_then(|builder| apply_env_overrides(builder, ENV_OVERRIDES, &env))
            .and_then(|builder| builder.build())
            .and_then(|config| config.try_deserialize::<Settings>());

        match with_file {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
                let config = apply_env_overrides(defaults()?, ENV_OVERRIDES, &env)?.build()?;
                Ok(config.try_deserialize()?)
            }
        }
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        // Chat backend defaults
        .set_default("grok.api_key", "")?
        .set_default("grok.proxy_url", "")?
        .set_default("grok.default_model", "grok-3-fast")?
        .set_default("grok.default_video_model", "grok-imagine-0.9")?
        .set_default("grok.stream_first_response_timeout", 30i64)?
        .set_default("grok.stream_chunk_timeout", 120i64)?
        .set_default("grok.stream_total_timeout", 600i64)?
        // Global defaults
        .set_default("global.base_url", "http://localhost:8000")?
        .set_default("global.log_level", "INFO")
}

/// Apply a fixed table of `(environment variable, settings key)` overrides in order.
/// Unset and empty variables leave the key alone.
pub fn apply_env_overrides<F>(
    builder: ConfigBuilder<DefaultState>,
    table: &[(&str, &str)],
    env: &F,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    table.iter().try_fold(builder, |builder, (name, key)| {
        builder.set_override_option(*key, env(name).filter(|value| !value.is_empty()))
    })
}
