use anyhow::Result;
use cliclack::spinner;
use std::future::Future;
use std::sync::Arc;

use grokbridge::config::Settings;
use grokbridge::errors::ToolResult;
use grokbridge::models::registry::StaticModelRegistry;
use grokbridge::providers::configs::OpenAiBackendConfig;
use grokbridge::providers::openai::OpenAiBackend;
use grokbridge::tools::{list_models, GrokTools};

use crate::render;

fn grok_tools(settings: &Settings) -> Result<GrokTools> {
    let config = OpenAiBackendConfig::from_settings(&settings.grok, &settings.global);
    let backend = OpenAiBackend::new(config)?;
    Ok(GrokTools::from_settings(Arc::new(backend), &settings.grok))
}

async fn run_with_spinner<F>(message: &str, call: F) -> Result<()>
where
    F: Future<Output = ToolResult<String>>,
{
    let spin = spinner();
    spin.start(message);
    match call.await {
        Ok(reply) => {
            spin.stop("");
            render::markdown(&reply)
        }
        Err(err) => {
            spin.error(&err);
            Err(err.into())
        }
    }
}

pub async fn ask(
    settings: &Settings,
    query: &str,
    model: Option<&str>,
    system: Option<&str>,
) -> Result<()> {
    let tools = grok_tools(settings)?;
    run_with_spinner("awaiting reply", tools.ask(query, model, system)).await
}

pub async fn image(settings: &Settings, prompt: &str, model: Option<&str>) -> Result<()> {
    let tools = grok_tools(settings)?;
    run_with_spinner("drawing", tools.generate_image(prompt, model)).await
}

pub async fn video(
    settings: &Settings,
    prompt: &str,
    image_url: &str,
    model: Option<&str>,
) -> Result<()> {
    let tools = grok_tools(settings)?;
    run_with_spinner("rendering video", tools.generate_video(prompt, image_url, model)).await
}

pub fn models() -> Result<()> {
    render::markdown(&list_models(&StaticModelRegistry::default()))
}
