//! Errors produced while loading models and material libraries.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Which attribute pool a face index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texcoord",
            Attribute::Normal => "normal",
        })
    }
}

/// A failed load. Nothing is cached when one of these is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Format {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// `index` is the resolved, zero-based index.
    #[error(
        "{}:{line}: {attribute} index {index} out of bounds (pool size {len})",
        path.display()
    )]
    IndexOutOfRange {
        path: PathBuf,
        line: usize,
        attribute: Attribute,
        index: i64,
        len: usize,
    },

    #[error("{}:{line}: no face group declared before this line", path.display())]
    NoActiveGroup { path: PathBuf, line: usize },

    #[error("failed to decode texture {}: {message}", path.display())]
    Texture { path: PathBuf, message: String },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        LoadError::Format {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// 1-based source line the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoadError::Format { line, .. }
            | LoadError::IndexOutOfRange { line, .. }
            | LoadError::NoActiveGroup { line, .. } => Some(*line),
            LoadError::Io { .. } | LoadError::Texture { .. } => None,
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;
