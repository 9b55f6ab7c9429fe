use std::time::Duration;

use crate::config::{GlobalSettings, GrokSettings};

/// Connection settings for an OpenAI-compatible chat backend
#[derive(Debug, Clone)]
pub struct OpenAiBackendConfig {
    pub host: String,
    pub api_key: Option<String>,
    pub proxy_url: Option<String>,
    pub timeout: Duration,
}

impl OpenAiBackendConfig {
    pub fn new<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            api_key: None,
            proxy_url: None,
            timeout: Duration::from_secs(600),
        }
    }

    pub fn from_settings(grok: &GrokSettings, global: &GlobalSettings) -> Self {
        Self {
            host: global.base_url.clone(),
            api_key: grok.api_key().map(String::from),
            proxy_url: grok.proxy_url().map(String::from),
            timeout: Duration::from_secs(grok.stream_total_timeout),
        }
    }
}
