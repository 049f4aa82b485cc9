use super::{Address, Hash};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Failures reported by the store collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Code not found for hash 0x{}", hex::encode(.0))]
    CodeNotFound(Hash),

    #[error("Account not found: 0x{}", hex::encode(.0))]
    AccountNotFound(Address),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Payload (de)serialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

/// Malformed hex field inside a genesis record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Data-integrity violations detected while reading or replaying genesis data.
#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("Short read in {}: expected {expected} bytes at offset {offset}, got {actual}", .path.display())]
    ShortRead {
        path: PathBuf,
        offset: u64,
        expected: u64,
        actual: u64,
    },

    #[error("Account 0x{} not found in store (record {index})", hex::encode(.address))]
    AccountNotFound { address: Address, index: u64 },

    #[error("Account 0x{} is not a contract account (record {index})", hex::encode(.address))]
    NotContractAccount { address: Address, index: u64 },

    #[error(
        "Code hash mismatch for 0x{} (record {index}): store has 0x{}, code hashes to 0x{}",
        hex::encode(.address),
        hex::encode(.expected),
        hex::encode(.actual)
    )]
    CodeHashMismatch {
        address: Address,
        index: u64,
        expected: Hash,
        actual: Hash,
    },

    #[error("Duplicate account 0x{} (record {index})", hex::encode(.address))]
    DuplicateAccount { address: Address, index: u64 },

    #[error("Incomplete export in {}: record count is zero", .path.display())]
    IncompleteExport { path: PathBuf },

    #[error("Trailing bytes in {} after last record at offset {offset}", .path.display())]
    TrailingBytes { path: PathBuf, offset: u64 },

    #[error("Missing genesis file {}", .path.display())]
    MissingPart { path: PathBuf },

    #[error("Params in {} differ from the first genesis file", .path.display())]
    ParamsMismatch { path: PathBuf },
}

/// Top-level error of the genesis export/import pipelines.
#[derive(Debug, Error)]
pub enum GenesisError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Genesis export terminated")]
    Terminated,

    #[error("Encoding error in {} at offset {offset}: {message}", .path.display())]
    Encoding {
        path: PathBuf,
        offset: u64,
        message: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("The {module} module account has not been set")]
    ModuleAccountMissing { module: String },

    #[error("Invalid genesis configuration: {0}")]
    InvalidConfig(String),
}

impl GenesisError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        GenesisError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn encoding(path: &Path, offset: u64, message: impl ToString) -> Self {
        GenesisError::Encoding {
            path: path.to_path_buf(),
            offset,
            message: message.to_string(),
        }
    }

    /// Cancellation is an unsuccessful but non-fatal outcome; callers may retry.
    pub fn is_terminated(&self) -> bool {
        matches!(self, GenesisError::Terminated)
    }

    pub fn is_integrity(&self) -> bool {
        matches!(self, GenesisError::Integrity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminated_is_distinct_from_failure() {
        assert!(GenesisError::Terminated.is_terminated());
        assert!(!GenesisError::Terminated.is_integrity());

        let err = GenesisError::from(IntegrityError::AccountNotFound {
            address: [0xAA; 20],
            index: 3,
        });
        assert!(err.is_integrity());
        assert!(!err.is_terminated());
    }

    #[test]
    fn test_mismatch_display_names_address_and_position() {
        let err = IntegrityError::CodeHashMismatch {
            address: [0x11; 20],
            index: 7,
            expected: [0x22; 32],
            actual: [0x33; 32],
        };
        let msg = err.to_string();
        assert!(msg.contains(&"11".repeat(20)));
        assert!(msg.contains("record 7"));
    }
}
