//! # Genesis Configuration
//!
//! Format selection, rollover threshold, file naming and the code-hash
//! mismatch policy for export/import.

use serde::{Deserialize, Serialize};

use super::entities::EVM_MODULE_NAME;
use super::errors::GenesisError;

/// Default part size that triggers a rollover (100 MB).
pub const DEFAULT_ROLLOVER_THRESHOLD: u64 = 100_000_000;

/// Default base name of chunked part files (`genesis0`, `genesis1`, ...).
pub const DEFAULT_FILE_BASE_NAME: &str = "genesis";

/// On-disk genesis format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenesisFormat {
    /// Length-prefixed records split across size-bounded parts.
    #[default]
    Chunked,
    /// One JSON document written and read in one shot.
    WholeBuffer,
}

/// What the importer does when exported code does not hash to the code
/// hash recorded for the live account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeHashMismatchPolicy {
    /// Stop the import with an integrity error.
    #[default]
    Abort,
    /// Leave the account untouched and report it in the import summary.
    Skip,
}

/// Configuration for genesis export/import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// File format (default: chunked).
    pub format: GenesisFormat,
    /// Bytes after which the current part is closed (default: 100 MB).
    pub rollover_threshold: u64,
    /// Base name of chunked parts; the part index is appended.
    pub file_base_name: String,
    /// Mismatch handling on import (default: abort).
    pub mismatch_policy: CodeHashMismatchPolicy,
    /// Module whose account must exist before import. Also names the
    /// whole-buffer file (`genesis_<module>.bin`).
    pub module_name: String,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            format: GenesisFormat::Chunked,
            rollover_threshold: DEFAULT_ROLLOVER_THRESHOLD,
            file_base_name: DEFAULT_FILE_BASE_NAME.to_string(),
            mismatch_policy: CodeHashMismatchPolicy::Abort,
            module_name: EVM_MODULE_NAME.to_string(),
        }
    }
}

impl GenesisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small rollover threshold so tests produce several parts.
    pub fn for_testing(rollover_threshold: u64) -> Self {
        Self {
            rollover_threshold,
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: GenesisFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_rollover_threshold(mut self, bytes: u64) -> Self {
        self.rollover_threshold = bytes;
        self
    }

    pub fn with_file_base_name(mut self, name: impl Into<String>) -> Self {
        self.file_base_name = name.into();
        self
    }

    pub fn with_mismatch_policy(mut self, policy: CodeHashMismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    pub fn with_module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = name.into();
        self
    }

    /// File name of part `index` of a chunked export.
    pub fn part_file_name(&self, index: usize) -> String {
        format!("{}{}", self.file_base_name, index)
    }

    /// File name of the whole-buffer export.
    pub fn whole_buffer_file_name(&self) -> String {
        module_file_name(&self.module_name)
    }

    pub fn validate(&self) -> Result<(), GenesisError> {
        if self.rollover_threshold == 0 {
            return Err(GenesisError::InvalidConfig(
                "Rollover threshold must be positive".to_string(),
            ));
        }

        if self.file_base_name.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "File base name must not be empty".to_string(),
            ));
        }

        if self.module_name.is_empty() {
            return Err(GenesisError::InvalidConfig(
                "Module name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// `genesis_<module>.bin`
pub fn module_file_name(module: &str) -> String {
    format!("genesis_{}.bin", module)
}
