use thiserror::Error;

/// Failures while turning a day's CSV download into usage quantities.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("malformed usage CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: column {column} is not a kWh value: {value:?}")]
    InvalidKwh {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line}: invalid reading timestamp {value:?}")]
    InvalidTimestamp { line: u64, value: String },
}
