use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A static asset (logo) could not be fetched or decoded. Fatal to the render.
    Asset { path: String, reason: String },
    InvalidInput(String),
    Pdf(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Asset { path, reason } => write!(f, "failed to load asset {path}: {reason}"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Pdf(msg) => write!(f, "PDF error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidInput(e.to_string())
    }
}
