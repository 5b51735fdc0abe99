use thiserror::Error;

use crate::controller::SubmissionStatus;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const REGISTER_FAILED: &str = "Failed to register";
pub const SERVER_ERROR_OCCURRED: &str = "Server error occurred";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The request never produced an HTTP response.
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-2xx status, or a body that could not be read as JSON.
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl SubmissionError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> &str {
        match self {
            SubmissionError::Transport(_) => GENERIC_FAILURE,
            SubmissionError::Server { message, .. } if message.trim().is_empty() => GENERIC_FAILURE,
            SubmissionError::Server { message, .. } => message,
        }
    }
}

impl From<reqwest::Error> for SubmissionError {
    fn from(value: reqwest::Error) -> Self {
        SubmissionError::Transport(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("form is locked while the submission is {0:?}")]
pub struct FormLocked(pub SubmissionStatus);
