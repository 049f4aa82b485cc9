use std::path::{Path, PathBuf};

use crate::domain::{ExportSummary, FeeMarketGenesis, GenesisError, ImportSummary};
use crate::ports::ExecutionContext;

/// Primary API for genesis operations
pub trait GenesisStateApi {
    // === Contract State ===

    /// Export every contract account plus parameters into `dir`.
    fn export_genesis(
        &self,
        dir: &Path,
        ctx: &dyn ExecutionContext,
    ) -> Result<ExportSummary, GenesisError>;

    /// Import a genesis directory or a single genesis file.
    fn init_genesis(&mut self, source: &Path) -> Result<ImportSummary, GenesisError>;

    // === Fee Market ===

    fn export_fee_market(&self, dir: &Path) -> Result<PathBuf, GenesisError>;

    fn init_fee_market(&mut self, dir: &Path) -> Result<FeeMarketGenesis, GenesisError>;
}
