use thiserror::Error;

/// Rejections raised before any request is issued. Shown to the user as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserInputError {
    #[error("Generation already in progress, please wait...")]
    GenerationInProgress,
    #[error("Please enter a prompt")]
    EmptyPrompt,
}

/// Failures talking to the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Network failure, timeout, or a body that is not the expected JSON.
    #[error("{0}")]
    Transport(String),
    /// The endpoint answered with `success: false` or a malformed success payload.
    #[error("{0}")]
    Application(String),
}

impl ApiError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("request timed out: {}", err))
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
