//! Decoding of `data: <json>` framed chat completion streams.
//!
//! Only lines that start with the literal `data: ` prefix carry events; heartbeats,
//! comments and any other framing are ignored. The `[DONE]` sentinel ends the stream.
use serde::Deserialize;
use tracing::debug;

pub const DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

/// A decoded unit of a chat stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaEvent {
    /// A content fragment, appended verbatim to the reply
    Content(String),
    /// The terminal sentinel. Nothing after it is read.
    Done,
}

/// What to do with a `data: ` record whose payload is not valid JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedChunkPolicy {
    /// Drop the record and keep decoding
    #[default]
    Skip,
    /// Fail the whole stream
    Abort,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Decode a single line. `Ok(None)` means the line carries nothing of interest.
pub fn decode_line(line: &str) -> Result<Option<DeltaEvent>, serde_json::Error> {
    let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return Ok(Some(DeltaEvent::Done));
    }

    let chunk: StreamChunk = serde_json::from_str(payload)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty())
        .map(DeltaEvent::Content))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SseDecoder {
    policy: MalformedChunkPolicy,
}

impl SseDecoder {
    pub fn new(policy: MalformedChunkPolicy) -> Self {
        Self { policy }
    }

    /// Decode one raw chunk into zero or more events.
    ///
    /// A chunk may hold several lines. Decoding stops at the first `Done`, which is
    /// always the last event returned.
    pub fn decode(&self, chunk: &str) -> Result<Vec<DeltaEvent>, serde_json::Error> {
        let mut events = Vec::new();
        for line in chunk.lines() {
            match decode_line(line) {
                Ok(Some(DeltaEvent::Done)) => {
                    events.push(DeltaEvent::Done);
                    break;
                }
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(err) => match self.policy {
                    MalformedChunkPolicy::Skip => {
                        debug!(error = %err, "skipping malformed stream chunk");
                    }
                    MalformedChunkPolicy::Abort => return Err(err),
                },
            }
        }
        Ok(events)
    }
}
