use thiserror::Error;

/// Top-level error type for lanledger domain values.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid timestamp '{value}': {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
