use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::errors::BackendError;
use crate::models::chat::ChatRequest;

/// Raw chunks of a streamed chat reply, each framed as `data: <json>` lines
pub type ChunkStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Base trait for chat backends that stream their replies
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Start a streamed completion for the request.
    ///
    /// Dropping the returned stream releases the underlying connection.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<ChunkStream, BackendError>;
}
