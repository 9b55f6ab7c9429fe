//! Collapses a streamed chat reply into one bounded string.
use futures::StreamExt;
use std::fmt::Display;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info};

use crate::errors::{ToolError, ToolResult};
use crate::models::chat::ChatRequest;
use crate::providers::base::{ChatBackend, ChunkStream};
use crate::sse::{DeltaEvent, SseDecoder};

/// Bounded waits applied while draining a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    /// Wait for the first chunk
    pub first_chunk: Duration,
    /// Wait between two consecutive chunks
    pub between_chunks: Duration,
    /// Budget for the whole stream
    pub total: Duration,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            first_chunk: Duration::from_secs(30),
            between_chunks: Duration::from_secs(120),
            total: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    decoder: SseDecoder,
    limits: StreamLimits,
}

impl Aggregator {
    pub fn new(decoder: SseDecoder, limits: StreamLimits) -> Self {
        Self { decoder, limits }
    }

    /// Send the request to the backend and collect the whole reply.
    pub async fn complete(
        &self,
        tool: &str,
        backend: &dyn ChatBackend,
        request: &ChatRequest,
    ) -> ToolResult<String> {
        info!(tool, model = %request.model, "chat tool called");
        let chunks = backend
            .stream_chat(request)
            .await
            .map_err(|err| invocation_failed(tool, err))?;

        let reply = self.collect(tool, chunks).await?;
        info!(tool, length = reply.len(), "chat tool finished");
        Ok(reply)
    }

    /// Drain a chunk stream, concatenating content deltas in arrival order.
    ///
    /// Stops at the first `[DONE]` or at the natural end of the stream. The stream is
    /// dropped as soon as the sentinel is seen, so nothing buffered behind it is read.
    pub async fn collect(&self, tool: &str, chunks: ChunkStream) -> ToolResult<String> {
        let mut chunks = chunks;
        let mut reply = String::new();
        let deadline = Instant::now() + self.limits.total;
        let mut wait = self.limits.first_chunk;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let next = match timeout(wait.min(remaining), chunks.next()).await {
                Ok(next) => next,
                Err(_) if remaining <= wait => {
                    return Err(invocation_failed(
                        tool,
                        format!("stream exceeded {}s", self.limits.total.as_secs()),
                    ));
                }
                Err(_) => {
                    return Err(invocation_failed(
                        tool,
                        format!("no chunk received within {}s", wait.as_secs()),
                    ));
                }
            };
            wait = self.limits.between_chunks;

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(err)) => return Err(invocation_failed(tool, err)),
                None => {
                    debug!(tool, "stream ended without sentinel");
                    break;
                }
            };

            let events = self
                .decoder
                .decode(&String::from_utf8_lossy(&chunk))
                .map_err(|err| invocation_failed(tool, format!("malformed chunk: {}", err)))?;

            let mut done = false;
            for event in events {
                match event {
                    DeltaEvent::Content(fragment) => reply.push_str(&fragment),
                    DeltaEvent::Done => done = true,
                }
            }
            if done {
                break;
            }
        }

        drop(chunks);
        Ok(reply)
    }
}

fn invocation_failed(tool: &str, reason: impl Display) -> ToolError {
    error!(tool, reason = %reason, "chat stream failed");
    ToolError::InvocationFailed {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BackendError;
    use crate::providers::mock::{delta, MockBackend};
    use crate::sse::MalformedChunkPolicy;
    use bytes::Bytes;
    use futures::stream;

    fn chunks(items: Vec<String>) -> ChunkStream {
        Box::pin(stream::iter(
            items
                .into_iter()
                .map(|c| Ok::<_, BackendError>(Bytes::from(c)))
                .collect::<Vec<_>>(),
        ))
    }

    #[tokio::test]
    async fn test_concatenates_in_order() {
        let reply = Aggregator::default()
            .collect(
                "ask",
                chunks(vec![delta("Hel"), delta("lo"), delta(", world")]),
            )
            .await
            .unwrap();
        assert_eq!(reply, "Hello, world");
    }

    #[tokio::test]
    async fn test_fragments_are_not_deduplicated() {
        let reply = Aggregator::default()
            .collect("ask", chunks(vec![delta("ha"), delta("ha"), delta(" ")]))
            .await
            .unwrap();
        assert_eq!(reply, "haha ");
    }

    #[tokio::test]
    async fn test_stops_at_done() {
        let reply = Aggregator::default()
            .collect(
                "ask",
                chunks(vec![
                    delta("a"),
                    "data: [DONE]\n\n".to_string(),
                    delta("ignored"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(reply, "a");
    }

    #[tokio::test]
    async fn test_does_not_poll_past_done() {
        let head = stream::iter(vec![
            Ok::<_, BackendError>(Bytes::from(delta("x"))),
            Ok(Bytes::from_static(b"data: [DONE]\n\n")),
        ]);
        let tail = stream::poll_fn(|_| -> std::task::Poll<Option<Result<Bytes, BackendError>>> {
            panic!("stream polled after the terminal sentinel")
        });
        let reply = Aggregator::default()
            .collect("ask", Box::pin(head.chain(tail)))
            .await
            .unwrap();
        assert_eq!(reply, "x");
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_skipped() {
        let reply = Aggregator::default()
            .collect(
                "ask",
                chunks(vec![
                    delta("one "),
                    "data: {\"choices\": [\n\n".to_string(),
                    delta("two"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(reply, "one two");
    }

    #[tokio::test]
    async fn test_abort_policy_fails_on_malformed_chunk() {
        let aggregator = Aggregator::new(
            SseDecoder::new(MalformedChunkPolicy::Abort),
            StreamLimits::default(),
        );
        let err = aggregator
            .collect("ask", chunks(vec![delta("one"), "data: nope\n".to_string()]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvocationFailed { .. }));
    }

    #[tokio::test]
    async fn test_end_of_stream_without_sentinel() {
        let reply = Aggregator::default()
            .collect("ask", chunks(vec![delta("partial")]))
            .await
            .unwrap();
        assert_eq!(reply, "partial");
    }

    #[tokio::test]
    async fn test_stream_error_is_wrapped() {
        let backend = MockBackend::with_items(vec![
            Ok(delta("a")),
            Err("connection reset".to_string()),
        ]);
        let request = ChatRequest::streaming("grok-3-fast", vec![]);

        let err = Aggregator::default()
            .complete("ask", &backend, &request)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::InvocationFailed {
                tool: "ask".to_string(),
                reason: "Chat backend stream broke: connection reset".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_backend_refusal_is_wrapped() {
        let backend = MockBackend::failing("no token");
        let request = ChatRequest::streaming("grok-3-fast", vec![]);

        let err = Aggregator::default()
            .complete("ask", &backend, &request)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Tool invocation failed (ask)"));
        assert!(err.to_string().contains("no token"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_chunk_timeout() {
        let aggregator = Aggregator::default();
        let err = aggregator
            .collect(
                "ask",
                Box::pin(stream::pending::<Result<Bytes, BackendError>>()),
            )
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::InvocationFailed {
                tool: "ask".to_string(),
                reason: "no chunk received within 30s".to_string(),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_timeout() {
        let limits = StreamLimits {
            first_chunk: Duration::from_secs(5),
            between_chunks: Duration::from_secs(5),
            total: Duration::from_secs(10),
        };
        // A chunk every 4 seconds never trips the per-chunk wait, only the total budget
        let slow = stream::unfold(0u32, |n| async move {
            tokio::time::sleep(Duration::from_secs(4)).await;
            Some((Ok::<_, BackendError>(Bytes::from(delta("."))), n + 1))
        });

        let err = Aggregator::new(SseDecoder::default(), limits)
            .collect("ask", Box::pin(slow))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ToolError::InvocationFailed {
                tool: "ask".to_string(),
                reason: "stream exceeded 10s".to_string(),
            }
        );
    }
}
