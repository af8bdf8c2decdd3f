// src/error.rs

//! Unified error handling for the takedown application.

use std::fmt;

use thiserror::Error;

/// Result type alias for takedown operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization failed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Search API returned an error response
    #[error("Search error for {target} page {page}: {message}")]
    Search {
        target: String,
        page: u32,
        message: String,
    },

    /// Owner profile fetch failed
    #[error("Profile fetch error for {url}: {message}")]
    Profile { url: String, message: String },

    /// Persisted record set could not be decoded in any known encoding
    #[error("Decode error for {path}: {message}")]
    Decode { path: String, message: String },

    /// Email delivery failed at the transport level
    #[error("Email error: {0}")]
    Email(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a search error with target and page context.
    pub fn search(target: impl Into<String>, page: u32, message: impl fmt::Display) -> Self {
        Self::Search {
            target: target.into(),
            page,
            message: message.to_string(),
        }
    }

    /// Create a profile fetch error.
    pub fn profile(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Profile {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error for a record-set source.
    pub fn decode(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an email transport error.
    pub fn email(message: impl Into<String>) -> Self {
        Self::Email(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
