use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected 3 or 5 fields, found {found}")]
    Arity { found: usize },

    #[error("field {index} is empty")]
    EmptyField { index: usize },

    #[error("field {index} is not a number: '{field}'")]
    NotANumber { index: usize, field: String },

    #[error("field {index} is not finite")]
    NotFinite { index: usize },
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("source '{}' does not exist", path.display())]
    SourceUnavailable { path: PathBuf },

    // usually the writer holding the file; retried next poll
    #[error("transient read failure: {0}")]
    IoTransient(#[from] std::io::Error),

    #[error("none of {lines} line(s) parsed")]
    NoValidLine { lines: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("history capacity must be at least 1")]
    Capacity,

    #[error("poll interval must be at least 1 ms")]
    PollInterval,

    #[error("unknown text encoding '{0}' (expected ascii, utf16 or utf16le)")]
    UnknownEncoding(String),

    #[error("distance multiplier must be finite and positive, got {0}")]
    Multiplier(f64),

    #[error("no-object threshold must be finite and positive, got {0}")]
    Threshold(f64),

    #[error("zoom base must be finite and greater than 1, got {0}")]
    ZoomBase(f64),

    #[error("invalid zoom extent limits: min {min:?}, max {max:?}")]
    Extent { min: Option<f64>, max: Option<f64> },

    #[error("initial view bounds must satisfy min < max on both axes")]
    ViewBounds,

    #[error("generator writes 3 or 5 fields, got {0}")]
    GeneratorArity(usize),

    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}
