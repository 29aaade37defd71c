//! Error types for the job digest pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON or is missing required keys
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field parsed but holds an unusable value
    #[error("invalid config field `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by the sent-set file store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read sent-set {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write sent-set {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised while querying the listings API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or body decode failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-2xx status
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Errors raised while delivering a digest.
#[derive(Debug, Error)]
pub enum MailError {
    /// The configured password variable is unset or empty
    #[error("SMTP password not set (expected in ${var})")]
    MissingCredential { var: String },

    #[error("invalid email address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("failed to build email message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}
