use thiserror::Error;

use crate::store::Collection;

#[derive(Error, Debug)]
pub enum HomecheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Index '{index}' is not declared on collection '{collection}'")]
    UnknownIndex {
        collection: Collection,
        index: String,
    },

    #[error("Inspection {id} cannot be completed: {pending} of {total} items still pending")]
    NotCompletable {
        id: String,
        pending: usize,
        total: usize,
    },

    #[error("Sync payload is a {found} record but the entry targets a {expected}")]
    PayloadMismatch { expected: String, found: String },

    #[error("Import error: {0}")]
    Import(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<image::ImageError> for HomecheckError {
    fn from(err: image::ImageError) -> Self {
        HomecheckError::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HomecheckError>;
