use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LensError {
    #[error("Upstream store unavailable: HTTP {status}: {body}")]
    UpstreamUnavailable { status: u16, body: String },

    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Malformed record at line {line}, field `{field}`: {reason}")]
    MalformedRecord {
        line: u64,
        field: String,
        reason: String,
    },

    #[error("Insufficient samples for category '{category}': {count} found, at least {required} required")]
    InsufficientClassSamples {
        category: String,
        count: usize,
        required: usize,
    },

    #[error("Insufficient classes: {0} distinct categories found, at least 2 required")]
    InsufficientClasses(usize),

    #[error("Artifact not found: {} (run `ledgerlens extract` first)", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Model error: {0}")]
    Model(String),
}

pub type Result<T> = std::result::Result<T, LensError>;

/// Pipeline step an error surfaced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Extract,
    Features,
    Train,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Extract => "extract",
            Self::Features => "features",
            Self::Train => "train",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: LensError,
}

/// Tag a fallible step with the stage it belongs to.
pub trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}
