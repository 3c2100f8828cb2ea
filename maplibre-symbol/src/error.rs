//! Errors which can happen around the symbol layout pass.
//!
//! The layout pass itself never fails: degenerate input is skipped and overflowing values are
//! clamped. Errors only arise while loading a style layer, while waiting for resources or while
//! handing the finished bucket to its consumer.

use thiserror::Error;

/// The style layer could not be read.
#[derive(Error, Debug)]
pub enum StyleError {
    #[error("failed to deserialize symbol layer")]
    Deserialize(#[from] serde_json::Error),
    #[error("layer {0} is not a symbol layer")]
    NotASymbolLayer(String),
}

/// Glyphs or images could not be resolved by the resource provider.
#[derive(Error, Debug)]
#[error("failed to fetch symbol resources")]
pub struct ResourceFetchError(#[source] pub Box<dyn std::error::Error + Send + Sync>);

/// The consumer of a finished layout refused the result.
#[derive(Error, Debug)]
#[error("sending the symbol bucket failed")]
pub struct SendError;

#[derive(Error, Debug)]
pub enum SymbolLayoutError {
    /// Glyphs or images for the tile were not available
    #[error("resolving symbol resources failed")]
    Resources(#[from] ResourceFetchError),
    /// The tile was invalidated while the layout was running, nothing has been committed
    #[error("symbol layout was cancelled")]
    Cancelled,
    /// Sending of results failed
    #[error("committing the symbol bucket failed")]
    Commit(#[from] SendError),
}
