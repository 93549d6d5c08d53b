use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use assay_codec::{decode_records, encode_header, encode_record, ResultRecord};

use crate::error::Result;
use crate::persist::write_atomic;

/// Append-only results table (`results.csv`).
///
/// A row reaching disk is the commit point of a submission: bootstrap replays
/// these rows over the snapshot.
#[derive(Debug)]
pub struct ResultLedger {
    path: PathBuf,
}

impl ResultLedger {
    /// Creates the file with its header if it does not exist yet, and cuts
    /// off a row left unterminated by an interrupted append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let ledger = Self { path: path.into() };
        match fs::read(&ledger.path) {
            Ok(bytes) => ledger.drop_torn_tail(&bytes)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                write_atomic(&ledger.path, &encode_header()?)?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(ledger)
    }

    /// An unterminated tail was never acknowledged to a caller, so it is not
    /// a committed row.
    fn drop_torn_tail(&self, bytes: &[u8]) -> Result<()> {
        if bytes.ends_with(b"\n") {
            return Ok(());
        }
        let keep = bytes.iter().rposition(|b| *b == b'\n').map_or(0, |i| i + 1);
        tracing::warn!(
            path = %self.path.display(),
            dropped = bytes.len() - keep,
            "ResultLedger: discarding torn final row"
        );
        if keep == 0 {
            write_atomic(&self.path, &encode_header()?)?;
        } else {
            write_atomic(&self.path, &bytes[..keep])?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row and flushes it to stable storage before returning.
    pub fn append(&mut self, record: &ResultRecord) -> Result<()> {
        let row = encode_record(record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        if file.metadata()?.len() == 0 {
            file.write_all(&encode_header()?)?;
        }
        file.write_all(&row)?;
        file.sync_data()?;
        Ok(())
    }

    /// Rewrites the table as header-only.
    pub fn truncate(&mut self) -> Result<()> {
        write_atomic(&self.path, &encode_header()?)?;
        Ok(())
    }

    pub fn records(&self) -> Result<Vec<ResultRecord>> {
        match fs::File::open(&self.path) {
            Ok(file) => Ok(decode_records(io::BufReader::new(file))?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    /// Raw CSV bytes for download. Header-only when nothing was submitted.
    pub fn export(&self) -> Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) if !bytes.is_empty() => Ok(bytes),
            Ok(_) => Ok(encode_header()?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(encode_header()?),
            Err(err) => Err(err.into()),
        }
    }
}
