//! Chat-backed tools: ask, image and video generation, and the model table.
//!
//! Image generation has no endpoint of its own. The backend draws when the prompt
//! asks it to, so the image tool only rewrites the prompt.
use std::sync::Arc;

use crate::aggregator::Aggregator;
use crate::config::GrokSettings;
use crate::errors::ToolResult;
use crate::models::chat::{ChatMessage, ChatRequest, ContentPart};
use crate::models::registry::ModelRegistry;
use crate::providers::base::ChatBackend;
use crate::sse::SseDecoder;

pub const DEFAULT_CHAT_MODEL: &str = "grok-3-fast";
pub const DEFAULT_VIDEO_MODEL: &str = "grok-imagine-0.9";

const MODEL_TYPE_LABEL: &str = "Basic/Super";
const SUPPORTED: &str = "✅";
const UNSUPPORTED: &str = "❌";

/// Build the request for a plain question, with an optional system prompt first
pub fn ask_request(query: &str, model: &str, system_prompt: Option<&str>) -> ChatRequest {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt.filter(|s| !s.is_empty()) {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(query));
    ChatRequest::streaming(model, messages)
}

/// The prompt that makes the backend draw
pub fn image_prompt(prompt: &str) -> String {
    format!("generate an image of {}", prompt)
}

/// Build the request for a video seeded by an image
pub fn video_request(prompt: &str, image_url: &str, model: &str) -> ChatRequest {
    ChatRequest::streaming(
        model,
        vec![ChatMessage::user_parts(vec![
            ContentPart::text(prompt),
            ContentPart::image_url(image_url),
        ])],
    )
}

pub struct GrokTools {
    backend: Arc<dyn ChatBackend>,
    aggregator: Aggregator,
    chat_model: String,
    video_model: String,
}

impl GrokTools {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            aggregator: Aggregator::default(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            video_model: DEFAULT_VIDEO_MODEL.to_string(),
        }
    }

    pub fn from_settings(backend: Arc<dyn ChatBackend>, settings: &GrokSettings) -> Self {
        Self {
            backend,
            aggregator: Aggregator::new(SseDecoder::default(), settings.stream_limits()),
            chat_model: settings.default_model.clone(),
            video_model: settings.default_video_model.clone(),
        }
    }

    pub fn with_aggregator(mut self, aggregator: Aggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Ask the backend a question and return the whole answer
    pub async fn ask(
        &self,
        query: &str,
        model: Option<&str>,
        system_prompt: Option<&str>,
    ) -> ToolResult<String> {
        let model = model.unwrap_or(&self.chat_model);
        let request = ask_request(query, model, system_prompt);
        self.aggregator
            .complete("ask", self.backend.as_ref(), &request)
            .await
    }

    /// Ask the backend to draw; the reply carries the image links
    pub async fn generate_image(&self, prompt: &str, model: Option<&str>) -> ToolResult<String> {
        self.ask(&image_prompt(prompt), model, None).await
    }

    /// Ask a video-capable model to animate the image at `image_url`.
    /// The url is passed through untouched; the backend reports bad links.
    pub async fn generate_video(
        &self,
        prompt: &str,
        image_url: &str,
        model: Option<&str>,
    ) -> ToolResult<String> {
        let model = model.unwrap_or(&self.video_model);
        let request = video_request(prompt, image_url, model);
        self.aggregator
            .complete("generate_video", self.backend.as_ref(), &request)
            .await
    }
}

/// Render the registry as a markdown table. Never fails: a registry error becomes
/// a one-line message instead.
pub fn list_models(registry: &dyn ModelRegistry) -> String {
    match render_model_table(registry) {
        Ok(table) => table,
        Err(err) => format!("Failed to list models: {}", err),
    }
}

fn render_model_table(registry: &dyn ModelRegistry) -> anyhow::Result<String> {
    let mut table = String::from("### Available Grok Models\n\n");
    table.push_str("| Model ID | Type | Image Gen | Video Gen |\n");
    table.push_str("|----------|------|-----------|-----------|\n");

    for id in registry.model_ids()? {
        let model = registry.descriptor(&id)?;
        let video = if model.is_video_model {
            SUPPORTED
        } else {
            UNSUPPORTED
        };
        table.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            id, MODEL_TYPE_LABEL, SUPPORTED, video
        ));
    }

    Ok(table)
}
