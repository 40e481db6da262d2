//! # workspace-db - Embedded object store for workspace graphs
//!
//! Persists a small set of plain records (users, workspace graphs of objects
//! and relationships) in an embedded SQLite engine and exposes them over HTTP.
//!
//! workspace-db provides:
//! - Plain record types with transitive persistence of owned children
//! - Scoped read/update sessions that always resolve their transaction
//! - A store initializer that creates, seeds, recreates and deletes the store
//! - Static schema introspection over the registered record types

pub mod record;
pub mod workspace;
pub mod schema;
pub mod storage;
pub mod server;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use record::{Record, User};
pub use workspace::{Position, Relationship, WorkspaceData, WorkspaceObject};
pub use schema::{Introspector, TypeDescriptor};
pub use storage::{Gateway, Session, SessionMode, StoreConfig, StoreInitializer, StoreStatus};

use serde::Serialize;
use std::path::PathBuf;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Store not initialized at {}", .0.display())]
    NotInitialized(PathBuf),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("No {0} record found")]
    RecordNotFound(&'static str),

    #[error("Type '{0}' not found")]
    TypeNotFound(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, machine-readable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotInitialized,
    InitializationFailed,
    SessionError,
    RecordNotFound,
    TypeNotFound,
    InvalidRecord,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotInitialized => "not_initialized",
            ErrorKind::InitializationFailed => "initialization_failed",
            ErrorKind::SessionError => "session_error",
            ErrorKind::RecordNotFound => "record_not_found",
            ErrorKind::TypeNotFound => "type_not_found",
            ErrorKind::InvalidRecord => "invalid_record",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Error {
    /// Engine, encoding and IO failures all surface as session errors.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotInitialized(_) => ErrorKind::NotInitialized,
            Error::InitializationFailed(_) => ErrorKind::InitializationFailed,
            Error::RecordNotFound(_) => ErrorKind::RecordNotFound,
            Error::TypeNotFound(_) => ErrorKind::TypeNotFound,
            Error::InvalidRecord(_) => ErrorKind::InvalidRecord,
            Error::Session(_) | Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => {
                ErrorKind::SessionError
            }
        }
    }
}
