//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use crate::parser::types::TypeId;
use thiserror::Error;

/// Errors that can occur while reading the trace or the type dump
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid trace format: {0}")]
    InvalidFormat(String),

    #[error("Record {index}: unrecognized phase '{phase}'")]
    UnknownPhase { index: usize, phase: String },

    #[error("Record {index}: unknown event name '{name}'")]
    UnknownEvent { index: usize, name: String },

    #[error("Record {index}: arguments of '{name}' do not match its schema: {source}")]
    InvalidArgs {
        index: usize,
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index}: malformed trace record: {source}")]
    InvalidRecord {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record {index}: event '{name}' cannot use phase '{phase}'")]
    PhaseMismatch {
        index: usize,
        name: String,
        phase: String,
    },

    #[error("Record {index}: complete event '{name}' has no duration")]
    MissingDuration { index: usize, name: String },

    #[error("Type record {index}: {reason}")]
    InvalidType { index: usize, reason: String },

    #[error("Duplicate type id {0} in type dump")]
    DuplicateType(TypeId),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur while validating or loading analysis options
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Options TOML parse error: {0}")]
    ParseFailed(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Fatal conditions raised by the analysis core
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Record {index}: unmatched end event '{name}' at {ts}us")]
    UnmatchedEnd { index: usize, name: String, ts: f64 },

    #[error("Type {0} not found")]
    TypeNotFound(TypeId),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
