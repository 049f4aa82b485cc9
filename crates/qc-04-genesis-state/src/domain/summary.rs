//! # Operation Summaries
//!
//! Results returned to callers of export and import.

use std::path::PathBuf;

use super::replay::SkippedAccount;

/// One file produced by a chunked export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedPart {
    pub path: PathBuf,
    /// Records in this part; the value patched into its header.
    pub records: u64,
    /// Bytes written, header included.
    pub bytes: u64,
}

/// Outcome of a successful export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Files in write order.
    pub parts: Vec<ExportedPart>,
    /// Accounts written across all parts.
    pub accounts: u64,
}

impl ExportSummary {
    pub fn bytes_written(&self) -> u64 {
        self.parts.iter().map(|part| part.bytes).sum()
    }

    pub fn files(&self) -> Vec<PathBuf> {
        self.parts.iter().map(|part| part.path.clone()).collect()
    }
}

/// Outcome of a successful import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Files read, in import order.
    pub files: Vec<PathBuf>,
    /// Accounts whose code and storage were replayed.
    pub accounts_applied: u64,
    /// Storage slots written.
    pub storage_slots: u64,
    /// Accounts left out under the skip policy.
    pub skipped: Vec<SkippedAccount>,
}
