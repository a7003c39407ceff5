//! Error taxonomy shared by the JJin Weather crates.
//!
//! Feature crates wrap these in their own enums. [`NetworkError`] covers the
//! weather, geocoding and OpenAI endpoints, [`DatabaseError`] the SQLite
//! cache, and [`ConfigError`] the settings file. Each one renders a
//! `user_message()` that a screen can show as its error state.

use thiserror::Error;

/// Failure while bringing the app up.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A feature crate's error, already rendered for display.
    #[error("{0}")]
    Service(String),
}

impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(e) => e.user_message().to_string(),
            AppError::Database(e) => e.user_message().to_string(),
            AppError::Config(e) => e.user_message().to_string(),
            AppError::Service(message) => message.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected payload: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status: 401 | 403, .. } => {
                "The service rejected our credentials. Check your API key."
            }
            NetworkError::ServerError { status: 429, .. } => {
                "Too many requests. Wait a moment and try again."
            }
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }

    /// `ServerError` for a non-success HTTP status and its body.
    pub fn from_status(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        NetworkError::ServerError {
            status: status.as_u16(),
            message: body.into(),
        }
    }
}

/// SQLite cache failures.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Could not open cache: {0}")]
    ConnectionFailed(String),

    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    #[error("Cached data is unreadable: {0}")]
    Corruption(String),
}

impl DatabaseError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatabaseError::ConnectionFailed(_) => {
                "Unable to open saved weather data. Try restarting the app."
            }
            DatabaseError::QueryFailed(_) => "Saved weather data could not be read or written.",
            DatabaseError::Corruption(_) => {
                "Saved weather data is damaged. Clearing the app data will fix this."
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Some settings are invalid. Check your config file.",
            ConfigError::Parse(_) => "The config file is malformed. Fix or delete it to reset.",
        }
    }
}

/// Classify a `reqwest::Error`.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::from_status(status, self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

/// Classify a `rusqlite::Error`.
pub trait RusqliteErrorExt {
    fn into_database_error(self) -> DatabaseError;
}

impl RusqliteErrorExt for rusqlite::Error {
    fn into_database_error(self) -> DatabaseError {
        match &self {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::DatabaseCorrupt
                    || err.code == rusqlite::ErrorCode::NotADatabase =>
            {
                DatabaseError::Corruption(self.to_string())
            }
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::CannotOpen =>
            {
                DatabaseError::ConnectionFailed(self.to_string())
            }
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => {
                DatabaseError::Corruption(self.to_string())
            }
            _ => DatabaseError::QueryFailed(self.to_string()),
        }
    }
}
