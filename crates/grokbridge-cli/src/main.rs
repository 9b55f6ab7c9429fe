use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use grokbridge::config::{Settings, DEFAULT_SETTINGS_PATH};
use grokbridge::rpc::dispatch::DEFAULT_SERVER_URL;

mod commands;
mod logging;
mod render;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Settings file for the chat backend
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    #[command(flatten)]
    bridge: BridgeArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct BridgeArgs {
    /// Tool server that tools/call requests are forwarded to
    #[arg(long, env = "MCP_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Bearer token for the tool server
    #[arg(long, env = "MCP_API_KEY")]
    pub api_key: Option<String>,

    /// Answer notifications with a null result instead of staying silent
    #[arg(long)]
    pub reply_to_notifications: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Bridge MCP JSON-RPC on stdin/stdout to the tool server (default)
    Bridge(BridgeArgs),

    /// Ask the chat backend a question
    Ask {
        query: String,

        #[arg(short, long)]
        model: Option<String>,

        /// System prompt sent before the question
        #[arg(short, long)]
        system: Option<String>,
    },

    /// Generate an image from a description
    Image {
        prompt: String,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// Generate a video from an image
    Video {
        prompt: String,

        /// Image the video starts from
        #[arg(long)]
        image_url: String,

        #[arg(short, long)]
        model: Option<String>,
    },

    /// List the models the chat backend offers
    Models,

    /// Print the version
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings =
        logging::before_init(|| Settings::load(&cli.settings, |name| std::env::var(name).ok()))?;
    logging::init(&settings.global.log_level);

    match cli.command.unwrap_or(Command::Bridge(cli.bridge)) {
        Command::Bridge(args) => commands::bridge::execute(args).await,
        Command::Ask {
            query,
            model,
            system,
        } => commands::tools::ask(&settings, &query, model.as_deref(), system.as_deref()).await,
        Command::Image { prompt, model } => {
            commands::tools::image(&settings, &prompt, model.as_deref()).await
        }
        Command::Video {
            prompt,
            image_url,
            model,
        } => commands::tools::video(&settings, &prompt, &image_url, model.as_deref()).await,
        Command::Models => commands::tools::models(),
        Command::Version => commands::version::execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_is_the_default() {
        let cli = Cli::try_parse_from([
            "grokbridge",
            "--server-url",
            "http://tools:9000",
            "--reply-to-notifications",
        ])
        .unwrap();

        assert_eq!(cli.command, None);
        assert_eq!(cli.bridge.server_url, "http://tools:9000");
        assert!(cli.bridge.reply_to_notifications);
    }

    #[test]
    fn test_explicit_bridge_subcommand() {
        let cli =
            Cli::try_parse_from(["grokbridge", "bridge", "--api-key", "secret"]).unwrap();

        let Some(Command::Bridge(args)) = cli.command else {
            panic!("expected the bridge subcommand");
        };
        assert_eq!(args.api_key.as_deref(), Some("secret"));
        assert!(!args.reply_to_notifications);
    }

    #[test]
    fn test_video_requires_image_url() {
        assert!(Cli::try_parse_from(["grokbridge", "video", "dance"]).is_err());

        let cli = Cli::try_parse_from([
            "grokbridge",
            "video",
            "dance",
            "--image-url",
            "https://img/cat.png",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Video {
                prompt: "dance".to_string(),
                image_url: "https://img/cat.png".to_string(),
                model: None,
            })
        );
    }

    #[test]
    fn test_settings_flag_is_global() {
        let cli = Cli::try_parse_from(["grokbridge", "models", "--settings", "/tmp/grok.toml"])
            .unwrap();
        assert_eq!(cli.settings, PathBuf::from("/tmp/grok.toml"));
        assert_eq!(cli.command, Some(Command::Models));
    }
}
