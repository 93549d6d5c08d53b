use std::fmt;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{CodecError, Result};

/// Column order of the results table. Part of the export surface.
pub const RESULT_HEADER: [&str; 6] = ["950", "FullName", "Guess", "Correct", "Result", "Period"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Correct,
    Wrong,
}

impl Outcome {
    /// Case-insensitive match of a submitted guess against the assigned label.
    pub fn judge(guess: &str, correct: &str) -> Self {
        if guess.to_lowercase() == correct.to_lowercase() {
            Outcome::Correct
        } else {
            Outcome::Wrong
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Correct => "CORRECT",
            Outcome::Wrong => "WRONG",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finalized submission. Never rewritten once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(rename = "950")]
    pub identity: String,
    #[serde(rename = "FullName")]
    pub display_name: String,
    #[serde(rename = "Guess")]
    pub guess: String,
    #[serde(rename = "Correct")]
    pub correct: String,
    #[serde(rename = "Result")]
    pub outcome: Outcome,
    #[serde(rename = "Period")]
    pub group: String,
}

/// Header line, terminated.
pub fn encode_header() -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(RESULT_HEADER)?;
    writer.into_inner().map_err(|e| CodecError::Io(e.into_error()))
}

/// A single data row, terminated. Fields are quoted only when needed.
pub fn encode_record(record: &ResultRecord) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.serialize(record)?;
    writer.into_inner().map_err(|e| CodecError::Io(e.into_error()))
}

/// Reads a whole results table. The header must match [`RESULT_HEADER`].
pub fn decode_records<R: Read>(reader: R) -> Result<Vec<ResultRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let header = reader.headers()?.clone();
    if header.iter().ne(RESULT_HEADER.iter().copied()) {
        return Err(CodecError::Header {
            found: header.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
