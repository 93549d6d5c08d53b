//! # assay-codec: Persisted and Wire Formats
//!
//! Everything that crosses a byte boundary in a fixed shape lives here:
//! the results table rows, and the trial-sheet catalog with its
//! client-facing projection.

pub mod results;
pub mod trials;

pub use results::{decode_records, encode_header, encode_record, Outcome, ResultRecord, RESULT_HEADER};
pub use trials::{decode_catalog, Catalog, TrialSheet, UiTrials};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("results header mismatch: {found:?}")]
    Header { found: Vec<String> },
}
