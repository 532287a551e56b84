//! Error handling for pipeview
//!
//! This module defines the crate-level error type and a Result alias for use
//! throughout the library. Module-local errors (graph lookups, activity
//! sources) convert into [`PipeViewError`] with `?`.

use crate::graph::GraphError;
use thiserror::Error;

/// Main error type for pipeview operations
#[derive(Error, Debug)]
pub enum PipeViewError {
    /// Errors related to graph model construction or lookup
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication with worker threads
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipeViewError>,
    },
}

impl PipeViewError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipeViewError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for PipeViewError {
    fn from(err: serde_json::Error) -> Self {
        PipeViewError::Serialization(err.to_string())
    }
}

/// Result type alias for pipeview operations
pub type Result<T> = std::result::Result<T, PipeViewError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, GraphError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| PipeViewError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PipeViewError::from(e).with_context(f()))
    }
}
