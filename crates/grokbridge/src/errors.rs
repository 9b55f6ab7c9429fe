use thiserror::Error;

/// Failures reported by a chat backend client.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Chat backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chat backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Chat backend stream broke: {0}")]
    Stream(String),
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool invocation failed ({tool}): {reason}")]
    InvocationFailed { tool: String, reason: String },
}

pub type ToolResult<T> = Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to read from input: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write to output: {0}")]
    Write(#[source] std::io::Error),
}
