use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("player handle for '{0}' is no longer valid")]
    StalePlayer(String),
    #[error("block at {0} is not loaded")]
    Unloaded(String),
    #[error("host rejected command '{command}': {reason}")]
    CommandRejected { command: String, reason: String },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to parse persisted data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported persisted schema version {0}")]
    UnsupportedVersion(u32),
    #[error("failed to access snapshot file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
