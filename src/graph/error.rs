//! Graph-model error types.

use thiserror::Error;

/// Errors that can occur when building or querying the graph model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("No node at path '{path}'")]
    NotFound { path: String },

    #[error("Invalid port reference: '{0}'")]
    InvalidPortRef(String),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;
