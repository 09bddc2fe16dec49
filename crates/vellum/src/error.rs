use std::io;
use std::path::PathBuf;

use mucore::dataimage::DecodeError;
use thiserror::Error;

/// A failed call across the editor capability boundary.
#[derive(Debug, Error)]
#[error("editor call failed: {0}")]
pub struct EditorError(pub String);

#[derive(Debug, Error)]
pub enum OpenError {
    /// Dialog dismissed or discard declined; silent by design.
    #[error("open cancelled")]
    Cancelled,
    #[error("not a readable file: {path}", path = .path.display())]
    NotAFile { path: PathBuf },
    #[error("file appears to be binary: {path}", path = .path.display())]
    BinaryContent { path: PathBuf },
    #[error("failed to read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Editor(#[from] EditorError),
}

#[derive(Debug, Error)]
pub enum SaveError {
    /// No associated path; the host routes this to save-as.
    #[error("document has no file path")]
    NoOpenPath,
    #[error("save cancelled")]
    Cancelled,
    #[error("failed to write {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Editor(#[from] EditorError),
}

#[derive(Debug, Error)]
pub enum ImageError {
    /// Image selection dialog dismissed; silent by design.
    #[error("image selection cancelled")]
    Cancelled,
    /// Neither an image nor a video as far as this layer is concerned.
    #[error("unsupported media type for {0:?}")]
    UnsupportedMediaType(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("image file error at {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Editor(#[from] EditorError),
}
