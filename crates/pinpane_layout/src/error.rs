//! Layout and configuration error types

use thiserror::Error;

use crate::tree::LayoutNodeId;

/// Errors raised by tree primitives
#[derive(Error, Debug)]
pub enum LayoutError {
    /// The node id is not (or no longer) part of the tree
    #[error("unknown layout node {0:?}")]
    UnknownNode(LayoutNodeId),

    /// An insert-before target is not a child of the parent
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild {
        parent: LayoutNodeId,
        child: LayoutNodeId,
    },

    /// Failure reported by the layout engine
    #[error("layout engine error: {0:?}")]
    Engine(taffy::TaffyError),
}

impl From<taffy::TaffyError> for LayoutError {
    fn from(err: taffy::TaffyError) -> Self {
        LayoutError::Engine(err)
    }
}

/// Errors raised while loading a pane configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid pane config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid pane config: {0}")]
    Invalid(String),
}

/// Result type for tree operations
pub type Result<T> = std::result::Result<T, LayoutError>;
