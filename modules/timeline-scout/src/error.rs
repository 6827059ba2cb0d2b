use browser_client::BrowserError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScoutError>;

#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Navigation failed for @{username}: {reason}")]
    Navigation { username: String, reason: String },

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Session store error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid username: {0:?}")]
    InvalidUsername(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl ScoutError {
    pub fn is_navigation(&self) -> bool {
        matches!(self, ScoutError::Navigation { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ScoutError::Browser(BrowserError::Timeout { .. }))
    }
}
