use thiserror::Error;

/// Errors raised by an automation backend while serving a capability call.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend not ready")]
    NotReady,

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}
