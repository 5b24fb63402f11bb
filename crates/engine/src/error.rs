use std::path::PathBuf;

/// Errors surfaced by the storage engine.
///
/// A missing key is not an error: `get` and `range` report absence via
/// `None` / an empty result, never via this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller tried to store the reserved tombstone marker as a genuine
    /// value.
    #[error("value equals the reserved tombstone marker {marker:?}; cannot insert")]
    InvalidValue { marker: &'static str },

    /// A filesystem operation failed.
    #[error("io error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A component file failed structural validation.
    #[error("corrupt component at {path:?}: {message}")]
    Corruption { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps an `anyhow::Error` bubbled up from the `sstable` crate.
    ///
    /// `sstable`'s own failures (bad header, truncated payload, offset past
    /// end of file) are structural, so they become `Corruption` here; a
    /// plain I/O failure underneath still reads clearly through the message.
    pub(crate) fn component(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Error::Corruption {
            path: path.into(),
            message: source.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
