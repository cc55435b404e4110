use thiserror::Error;

/// Malformed MTL text.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: expected 'KEY = VALUE', found '{content}'")]
    MissingSeparator { line: usize, content: String },

    #[error("line {line}: END_GROUP = {name} closes a group that was never opened")]
    UnmatchedEndGroup { line: usize, name: String },

    #[error("group '{name}' is never closed")]
    UnclosedGroup { name: String },
}

/// An expected key is absent from a parsed MTL tree, or holds the wrong kind of entry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LookupError {
    #[error("missing key '{0}'")]
    Missing(String),

    #[error("'{0}' is a group, expected a value")]
    NotAValue(String),

    #[error("'{0}' is a value, expected a group")]
    NotAGroup(String),

    #[error("'{key}' holds '{value}', which is not a number")]
    NotANumber { key: String, value: String },
}

/// A failed network round trip.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid url '{0}'")]
    Url(#[from] url::ParseError),
}

impl TransportError {
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Request {
            url: url.into(),
            source,
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("io error on {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("malformed feed document")]
    Feed(#[from] roxmltree::Error),
}

impl Error {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
