use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::sync::{Arc, Mutex};

use super::base::{ChatBackend, ChunkStream};
use crate::errors::BackendError;
use crate::models::chat::ChatRequest;

/// A mock backend that replays pre-configured chunks and records every request
#[derive(Clone, Default)]
pub struct MockBackend {
    chunks: Vec<Result<String, String>>,
    fail_with: Option<String>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockBackend {
    /// Create a mock backend that streams the given raw chunks
    pub fn new<S: Into<String>>(chunks: Vec<S>) -> Self {
        Self {
            chunks: chunks.into_iter().map(|c| Ok(c.into())).collect(),
            ..Self::default()
        }
    }

    /// Create a mock backend whose stream yields the given items, errors included
    pub fn with_items(chunks: Vec<Result<String, String>>) -> Self {
        Self {
            chunks,
            ..Self::default()
        }
    }

    /// Create a mock backend that refuses every request
    pub fn failing<S: Into<String>>(reason: S) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Build a `data: ` line carrying one content delta
pub fn delta(content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({"choices": [{"index": 0, "delta": {"content": content}}]})
    )
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(reason) = &self.fail_with {
            return Err(BackendError::Status {
                status: 403,
                body: reason.clone(),
            });
        }

        let items: Vec<Result<Bytes, BackendError>> = self
            .chunks
            .iter()
            .map(|item| match item {
                Ok(chunk) => Ok(Bytes::from(chunk.clone())),
                Err(reason) => Err(BackendError::Stream(reason.clone())),
            })
            .collect();
        Ok(Box::pin(stream::iter(items)))
    }
}
