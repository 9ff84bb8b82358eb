use thiserror::Error;

/// Failures of a single aggregator query. Every variant renders with the same
/// `Search failed:` prefix so callers see one kind of message.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search failed: {0}")]
    InvalidRequest(String),

    #[error("Search failed: HTTP {status}: {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Search failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Search failed: invalid JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures surfaced by the tool layer.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}
