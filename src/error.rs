use thiserror::Error;

pub type Result<T> = std::result::Result<T, SidelineError>;

#[derive(Debug, Error)]
pub enum SidelineError {
    #[error("tool `{0}` not found")]
    ToolNotFound(String),

    #[error("tool `{name}` invocation failed: {source}")]
    ToolInvocation {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("agent `{0}` not found")]
    AgentNotFound(String),

    #[error("agent runtime error: {0}")]
    Runtime(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
