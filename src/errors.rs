//! Error types for the sterling application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur while managing notes, persisting state and running layouts.
//! Store commands themselves never fail: misses on absent ids are absorbed.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the sterling application.
#[derive(Error, Debug)]
pub enum SterlingError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when the caller needed it to exist.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Tag was not found when the caller needed it to exist.
    #[error("Tag not found: {id}")]
    TagNotFound { id: String },

    /// Invalid input or stored data format.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Unknown settings key or a value that does not parse for that key.
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },

    /// The layout scheduler could not be started or stopped cleanly.
    #[error("Layout scheduler error: {message}")]
    SchedulerError { message: String },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
