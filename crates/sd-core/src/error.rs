use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl SdError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized")]
    Unauthorized { server_error: Option<String> },

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error")]
    Server,

    #[error("API error ({status})")]
    Status {
        status: u16,
        server_error: Option<String>,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Stream error: {0}")]
    Stream(String),
}

impl ApiError {
    /// Classify a non-success HTTP status. `server_error` is the `error`
    /// field of the response body, if the server sent one.
    pub fn from_status(status: u16, server_error: Option<String>) -> Self {
        match status {
            401 => Self::Unauthorized { server_error },
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500 => Self::Server,
            _ => Self::Status {
                status,
                server_error,
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Forbidden => Some(403),
            Self::NotFound => Some(404),
            Self::Server => Some(500),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Network error, please try again later".into(),
            Self::Unauthorized { server_error } => server_error
                .clone()
                .unwrap_or_else(|| "Unauthorized, please log in again".into()),
            Self::Forbidden => "You do not have permission to perform this action".into(),
            Self::NotFound => "The requested resource does not exist".into(),
            Self::Server => "Internal server error".into(),
            Self::Status {
                status,
                server_error,
            } => server_error
                .clone()
                .unwrap_or_else(|| format!("Unknown error, status code: {status}")),
            Self::Decode(_) => "Unexpected response from the server".into(),
            Self::Stream(_) => "Chat connection interrupted".into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
