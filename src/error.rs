use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to Odoo or writing the project files.
#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Odoo error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Unexpected response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid connection file {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("Authentication failed for {login} on database {database}")]
    AuthenticationFailed { login: String, database: String },

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Model {0} not found")]
    ModelNotFound(String),
}

pub type Result<T> = std::result::Result<T, Error>;
