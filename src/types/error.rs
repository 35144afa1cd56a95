//! Error types for the hierarchical memory store.

use thiserror::Error;

/// The category of a [`MemoryError`], without its detail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryErrorKind {
    ParentNotFound,
    MemoryNotFound,
    InvalidContent,
    InvalidTags,
    FileIoError,
    JsonParseError,
    CircularDependency,
}

impl std::fmt::Display for MemoryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ParentNotFound => "ParentNotFound",
            Self::MemoryNotFound => "MemoryNotFound",
            Self::InvalidContent => "InvalidContent",
            Self::InvalidTags => "InvalidTags",
            Self::FileIoError => "FileIOError",
            Self::JsonParseError => "JsonParseError",
            Self::CircularDependency => "CircularDependency",
        };
        f.write_str(name)
    }
}

/// All errors that can occur in the store. Each carries a human-readable detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// A parent ID does not name an existing memory.
    #[error("Parent memory not found: {0}")]
    ParentNotFound(String),

    /// An ID does not name an existing memory.
    #[error("Memory not found: {0}")]
    MemoryNotFound(String),

    /// Content is empty, too long, or a pattern/level failed to parse.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// Tag list is too long, or a tag is empty, too long or has a bad character.
    #[error("Invalid tags: {0}")]
    InvalidTags(String),

    /// Reading or writing the data file failed.
    #[error("File I/O error: {0}")]
    FileIo(String),

    /// The data file is not valid JSON for the memory schema.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Attaching a parent would make an entry its own ancestor.
    #[error("Circular dependency: {0}")]
    CircularDependency(String),
}

impl MemoryError {
    /// The kind of this error.
    pub fn kind(&self) -> MemoryErrorKind {
        match self {
            Self::ParentNotFound(_) => MemoryErrorKind::ParentNotFound,
            Self::MemoryNotFound(_) => MemoryErrorKind::MemoryNotFound,
            Self::InvalidContent(_) => MemoryErrorKind::InvalidContent,
            Self::InvalidTags(_) => MemoryErrorKind::InvalidTags,
            Self::FileIo(_) => MemoryErrorKind::FileIoError,
            Self::JsonParse(_) => MemoryErrorKind::JsonParseError,
            Self::CircularDependency(_) => MemoryErrorKind::CircularDependency,
        }
    }

    /// The detail message without the kind prefix.
    pub fn detail(&self) -> &str {
        match self {
            Self::ParentNotFound(d)
            | Self::MemoryNotFound(d)
            | Self::InvalidContent(d)
            | Self::InvalidTags(d)
            | Self::FileIo(d)
            | Self::JsonParse(d)
            | Self::CircularDependency(d) => d,
        }
    }
}

impl From<std::io::Error> for MemoryError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIo(err.to_string())
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return Self::FileIo(err.to_string());
        }
        Self::JsonParse(err.to_string())
    }
}

/// Convenience result type for store operations.
pub type MemoryResult<T> = Result<T, MemoryError>;
