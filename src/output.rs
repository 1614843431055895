//! ExifTool JSON output handling

use crate::error::{ExifError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Tag name to value for one subject
pub type Record = Map<String, Value>;

/// Extraction result
///
/// One reported subject yields `Single`; anything else (several, or none)
/// yields `Multiple`. Serializes as a bare JSON object or array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Single(Record),
    Multiple(Vec<Record>),
}

impl Metadata {
    pub fn len(&self) -> usize {
        match self {
            Metadata::Single(_) => 1,
            Metadata::Multiple(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_single(&self) -> Option<&Record> {
        match self {
            Metadata::Single(record) => Some(record),
            Metadata::Multiple(_) => None,
        }
    }

    /// Flatten to a list, whatever the shape
    pub fn into_records(self) -> Vec<Record> {
        match self {
            Metadata::Single(record) => vec![record],
            Metadata::Multiple(records) => records,
        }
    }
}

impl From<Vec<Record>> for Metadata {
    fn from(mut records: Vec<Record>) -> Self {
        if records.len() == 1 {
            Metadata::Single(records.remove(0))
        } else {
            Metadata::Multiple(records)
        }
    }
}

/// Turn captured process output into a result.
///
/// Parseable stdout wins regardless of exit code. Otherwise stderr decides
/// between `ToolFailed` and `UnparseableOutput`.
pub fn resolve_output(exit_code: Option<i32>, stdout: &[u8], stderr: &[u8]) -> Result<Metadata> {
    match serde_json::from_slice::<Vec<Record>>(stdout) {
        Ok(records) => {
            if exit_code != Some(0) {
                warn!(
                    exit_code = ?exit_code,
                    records = records.len(),
                    "exiftool exited abnormally but produced parseable output"
                );
            }
            Ok(Metadata::from(records))
        }
        Err(_) => {
            let stdout = String::from_utf8_lossy(stdout).into_owned();
            let stderr = String::from_utf8_lossy(stderr).into_owned();
            if stderr.is_empty() {
                Err(ExifError::UnparseableOutput { exit_code, stderr, stdout })
            } else {
                Err(ExifError::ToolFailed { exit_code, stderr, stdout })
            }
        }
    }
}
