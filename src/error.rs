use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed index data in {context}: {source}")]
    MalformedIndexData {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("config write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("data directory does not exist and could not be created: {0}")]
    DataDir(PathBuf),

    #[error("{kind} cannot be used as a directory name: {value:?}")]
    InvalidPathComponent { kind: &'static str, value: String },
}

impl Error {
    /// Replace the context of a [`Error::MalformedIndexData`] with the file
    /// it was read from. Other variants pass through untouched.
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Error::MalformedIndexData { source, .. } => {
                Error::MalformedIndexData {
                    context: path.display().to_string(),
                    source,
                }
            }
            other => other,
        }
    }
}
