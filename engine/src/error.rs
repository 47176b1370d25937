use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Source unavailable '{}': {}", .path.display(), .source)]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema error: required column '{column}' is missing")]
    SchemaError { column: String },

    #[error("Parse error at line {line}, column '{column}': {reason} (value '{value}')")]
    ParseError {
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    // Ragged rows, invalid UTF-8 and other structural CSV failures.
    #[error("CSV parsing system error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration file '{}': {}", .path.display(), .source)]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl EngineError {
    /// True for failures that mean no table could be produced from the source.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            EngineError::SourceUnavailable { .. }
                | EngineError::SchemaError { .. }
                | EngineError::ParseError { .. }
                | EngineError::Csv { .. }
        )
    }
}
