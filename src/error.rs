//! Custom error types for GuildForge.
//!
//! This module provides a centralized error handling system with specific error types
//! for different parts of the application, and the mapping of those errors onto
//! panel HTTP responses.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::platform::PlatformError;
use crate::remote::RemoteFailure;

/// Main error type for GuildForge operations.
#[derive(Debug)]
pub enum GuildForgeError {
    /// Configuration errors (missing env vars, invalid values)
    Config(String),
    /// Network/HTTP errors outside of the retrying client
    Network(String),
    /// Game-server player API errors
    PlayerApi(String),
    /// Discord bot errors
    Discord(String),
    /// Validation errors (bad counts, templates, colors)
    Validation(String),
    /// A referenced guild or resource does not exist
    NotFound(String),
    /// Classified failure from the retrying remote client
    Remote(RemoteFailure),
    /// Failure reported by the chat platform collaborator
    Platform(PlatformError),
    /// Generic I/O errors
    Io(std::io::Error),
}

impl fmt::Display for GuildForgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::PlayerApi(msg) => write!(f, "Player API error: {}", msg),
            Self::Discord(msg) => write!(f, "Discord error: {}", msg),
            Self::Validation(msg) => write!(f, "Validation error: {}", msg),
            Self::NotFound(msg) => write!(f, "Not found: {}", msg),
            Self::Remote(failure) => write!(f, "Remote call failed: {}", failure),
            Self::Platform(err) => write!(f, "Platform error: {}", err),
            Self::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for GuildForgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GuildForgeError::Io(err) => Some(err),
            GuildForgeError::Remote(failure) => Some(failure),
            GuildForgeError::Platform(err) => Some(err),
            _ => None,
        }
    }
}

// Implement From traits for automatic error conversion
impl From<std::io::Error> for GuildForgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<reqwest::Error> for GuildForgeError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GuildForgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::PlayerApi(format!("JSON parsing error: {}", err))
    }
}

impl From<std::env::VarError> for GuildForgeError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<tokio::task::JoinError> for GuildForgeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Discord(format!("Task join error: {}", err))
    }
}

impl From<poise::serenity_prelude::Error> for GuildForgeError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        Self::Discord(err.to_string())
    }
}

impl From<RemoteFailure> for GuildForgeError {
    fn from(failure: RemoteFailure) -> Self {
        Self::Remote(failure)
    }
}

impl From<PlatformError> for GuildForgeError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Platform(other),
        }
    }
}

/// Body of every panel error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl GuildForgeError {
    /// HTTP status the panel answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(_) | Self::Platform(_) | Self::Discord(_) | Self::PlayerApi(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Config(_) | Self::Network(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GuildForgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Result type alias for GuildForge operations.
pub type Result<T> = std::result::Result<T, GuildForgeError>;
