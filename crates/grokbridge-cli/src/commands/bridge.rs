use anyhow::Result;
use tracing::info;

use grokbridge::rpc::dispatch::DEFAULT_TIMEOUT;
use grokbridge::rpc::{run_stdio, BridgeConfig, Dispatcher, ServeOptions};

use crate::BridgeArgs;

pub fn bridge_config(args: &BridgeArgs) -> BridgeConfig {
    BridgeConfig {
        server_url: args.server_url.clone(),
        api_key: args.api_key.clone().filter(|key| !key.is_empty()),
        timeout: DEFAULT_TIMEOUT,
    }
}

/// Runs until stdin closes. Stdout carries response lines only.
pub async fn execute(args: BridgeArgs) -> Result<()> {
    let config = bridge_config(&args);
    info!(
        server_url = %config.server_url,
        api_key_configured = config.api_key.is_some(),
        "starting MCP bridge"
    );

    let dispatcher = Dispatcher::new(config);
    let options = ServeOptions {
        reply_to_notifications: args.reply_to_notifications,
    };
    run_stdio(&dispatcher, options).await?;
    Ok(())
}
