use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response. `message` is the server's `{message}` field when present.
    #[error("Request failed with status code {status}")]
    Http { status: u16, message: Option<String> },

    #[error("Response error: {0}")]
    Parse(String),
}

impl AppError {
    /// Message supplied by the server, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Http {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}
