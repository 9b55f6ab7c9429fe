use reqwest::Client;

use crate::configuration::ProxySettings;

/// Shared by every request; the client pools upstream connections.
#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub upstream_url: String,
    pub api_key: String,
}

impl AppState {
    pub fn new(settings: &ProxySettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            upstream_url: settings.upstream_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}
