//! Error type for scene import, rewrite and export.
//!
//! Per-entity regex failures during renaming are not errors: they are
//! reported as [`RenameEvent::RegexError`](crate::rename::RenameEvent) and
//! the run continues. Everything here aborts the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The scene file (or an external buffer it references) could not be read
    #[error("cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination could not be written
    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The JSON document is malformed or does not fit the glTF schema
    #[error("invalid glTF document: {0}")]
    Json(#[from] serde_json::Error),

    /// GLB framing is broken (bad magic, version, or chunk lengths)
    #[error("invalid GLB container: {0}")]
    Container(String),

    /// The first buffer cannot be embedded into a GLB `BIN` chunk
    #[error("cannot embed buffer 0: {0}")]
    Buffer(String),

    /// A buffer URI is not valid percent-encoded UTF-8
    #[error("invalid URI '{0}'")]
    Uri(String),
}
