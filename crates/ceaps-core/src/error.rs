use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the CEAPS pipeline.
///
/// Loading errors (`InputPathNotFound`, `NoCsvFiles`, `Decode`, `Parse`) are
/// fail-fast: they abort the whole run with no partial result. Row-level
/// issues during normalization never surface here; the affected field simply
/// becomes missing.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The input file or directory does not exist.
    #[error("Input path not found: {0}")]
    InputPathNotFound(PathBuf),

    /// The input directory contains no CSV files.
    #[error("No CSV files found in {0}")]
    NoCsvFiles(PathBuf),

    /// Byte content could not be decoded under the resolved encoding.
    #[error("Could not decode {path} as {encoding}: check the file encoding or use --encoding auto")]
    Decode { path: PathBuf, encoding: String },

    /// The file structure does not match the configured separator.
    #[error("Could not parse {path}: {detail}. Check the separator")]
    Parse { path: PathBuf, detail: String },

    /// A monetary value contained no digits after cleaning.
    #[error("Monetary value {0:?} contains no digits")]
    NumericFormat(String),

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for CSV machinery errors that do not carry a path.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the pipeline crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
