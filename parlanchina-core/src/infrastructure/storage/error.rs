use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session '{id}' not found")]
    SessionNotFound { id: String },
}

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image payload is empty")]
    EmptyPayload,
    #[error("image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("failed to write image to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
