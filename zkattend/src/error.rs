//! High-level error types

use zkattend_core::Command;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] zkattend_core::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] zkattend_transport::Error),

    #[error("Record error: {0}")]
    Types(#[from] zkattend_types::Error),

    #[error("Device not connected")]
    NotConnected,

    #[error("Device rejected {command} with {reply}")]
    Rejected { command: Command, reply: Command },

    #[error("Invalid response from device: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// True when the terminal could not be reached or the link dropped.
    ///
    /// Everything else means the terminal answered, but not in a way we
    /// could use.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_link_failure(),
            Self::NotConnected => true,
            _ => false,
        }
    }
}
