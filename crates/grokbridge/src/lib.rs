pub mod aggregator;
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod rpc;
pub mod sse;
pub mod tool;
pub mod tools;
