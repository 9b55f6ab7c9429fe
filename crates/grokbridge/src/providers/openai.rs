use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use reqwest::{Client, Proxy};
use tracing::debug;

use super::base::{ChatBackend, ChunkStream};
use super::configs::OpenAiBackendConfig;
use crate::errors::BackendError;
use crate::models::chat::ChatRequest;

/// Chat backend speaking the OpenAI streaming chat completions protocol
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiBackendConfig,
}

impl OpenAiBackend {
    pub fn new(config: OpenAiBackendConfig) -> Result<Self, BackendError> {
        let mut builder = Client::builder().timeout(config.timeout);
        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
        let mut builder = self.client.post(self.url()).json(request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(model = %request.model, "chat stream opened");
        Ok(frame_lines(response.bytes_stream()))
    }
}

/// Re-frame an HTTP body into one chunk per line, so a network read that splits a
/// `data: ` record never reaches the decoder as two halves. Blank lines are dropped.
pub fn frame_lines<S>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        pin_mut!(body);
        let mut pending = BytesMut::new();

        while let Some(next) = body.next().await {
            match next {
                Ok(bytes) => {
                    pending.extend_from_slice(&bytes);
                    while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
                        let line = pending.split_to(pos + 1).freeze();
                        if !line.iter().all(u8::is_ascii_whitespace) {
                            yield Ok(line);
                        }
                    }
                }
                Err(err) => {
                    yield Err(BackendError::Http(err));
                    break;
                }
            }
        }

        if !pending.iter().all(u8::is_ascii_whitespace) {
            yield Ok(pending.freeze());
        }
    })
}
