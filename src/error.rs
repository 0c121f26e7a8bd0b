use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Backend responded with status {0}")]
    Status(u16),

    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if let Some(status) = e.status() {
            ClientError::Status(status.as_u16())
        } else {
            ClientError::Http(e)
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("A question is already being answered")]
    Busy,

    #[error("Empty question")]
    EmptyQuery,

    #[error("No initial question at index {0}")]
    UnknownInitialQuestion(usize),

    #[error("Search failed: {0}")]
    Relay(#[from] ClientError),
}
