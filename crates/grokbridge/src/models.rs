//! These models represent the objects the bridge passes to and receives from a chat backend
//!
//! There are two related formats we need to interact with:
//! - openai-style chat requests, sent from the tool adapters to the chat backend
//! - the model registry, describing which backend models exist and what they can do
//!
//! Requests are always streamed; the aggregator collapses the stream into a single reply.
pub mod chat;
pub mod registry;
