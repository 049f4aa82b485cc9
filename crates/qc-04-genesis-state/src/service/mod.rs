//! # Genesis Service
//!
//! Public entry points of the export/import pipelines.
//!
//! ## Error Boundary
//!
//! Errors inside the per-account loops stop iteration and propagate as typed
//! results. The functions in this module are the only place failures are
//! logged; they still return the error to the caller.

mod exporter;
mod feemarket;
mod importer;


use std::path::{Path, PathBuf};

pub use exporter::GenesisExporter;
pub use feemarket::{export_fee_market, export_fee_market_to, init_fee_market, init_fee_market_from};
pub use importer::GenesisImporter;

use crate::domain::{ExportSummary, FeeMarketGenesis, GenesisConfig, GenesisError, ImportSummary};
use crate::ports::{ExecutionContext, FeeMarketKeeper, GenesisStateApi, GenesisStateStore};

fn log_failure(operation: &str, path: &Path, err: &GenesisError) {
    if err.is_terminated() {
        tracing::warn!("[qc-04] Genesis {} of {} terminated", operation, path.display());
    } else {
        tracing::error!(
            "[qc-04] Genesis {} of {} failed: {}",
            operation,
            path.display(),
            err
        );
    }
}

/// Export contract-state genesis into `dir`.
///
/// On failure, files already written stay on disk. A part whose header
/// count is still zero while records follow is incomplete.
pub fn export_genesis_to<S, C>(
    state: &S,
    dir: &Path,
    config: &GenesisConfig,
    ctx: &C,
) -> Result<ExportSummary, GenesisError>
where
    S: GenesisStateStore + ?Sized,
    C: ExecutionContext + ?Sized,
{
    tracing::info!("[qc-04] Exporting genesis to {}", dir.display());

    let result = GenesisExporter::new(config.clone()).export_to(state, dir, ctx);
    match &result {
        Ok(summary) => tracing::info!(
            "[qc-04] Exported {} genesis accounts in {} file(s), {} bytes",
            summary.accounts,
            summary.parts.len(),
            summary.bytes_written()
        ),
        Err(err) => log_failure("export", dir, err),
    }
    result
}

/// Import contract-state genesis from a directory or a single file.
pub fn init_genesis_from<S>(
    state: &mut S,
    source: &Path,
    config: &GenesisConfig,
) -> Result<ImportSummary, GenesisError>
where
    S: GenesisStateStore + ?Sized,
{
    tracing::info!("[qc-04] Importing genesis from {}", source.display());

    let result = GenesisImporter::new(config.clone()).import_from(state, source);
    match &result {
        Ok(summary) => tracing::info!(
            "[qc-04] Imported {} genesis accounts ({} storage slots, {} skipped) from {} file(s)",
            summary.accounts_applied,
            summary.storage_slots,
            summary.skipped.len(),
            summary.files.len()
        ),
        Err(err) => log_failure("import", source, err),
    }
    result
}

/// Genesis operations bound to one store.
pub struct GenesisService<S> {
    store: S,
    config: GenesisConfig,
}

impl<S> GenesisService<S> {
    pub fn new(store: S, config: GenesisConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &GenesisConfig {
        &self.config
    }
}

impl<S> GenesisStateApi for GenesisService<S>
where
    S: GenesisStateStore + FeeMarketKeeper,
{
    fn export_genesis(
        &self,
        dir: &Path,
        ctx: &dyn ExecutionContext,
    ) -> Result<ExportSummary, GenesisError> {
        export_genesis_to(&self.store, dir, &self.config, ctx)
    }

    fn init_genesis(&mut self, source: &Path) -> Result<ImportSummary, GenesisError> {
        init_genesis_from(&mut self.store, source, &self.config)
    }

    fn export_fee_market(&self, dir: &Path) -> Result<PathBuf, GenesisError> {
        export_fee_market_to(&self.store, dir).inspect_err(|err| log_failure("export", dir, err))
    }

    fn init_fee_market(&mut self, dir: &Path) -> Result<FeeMarketGenesis, GenesisError> {
        init_fee_market_from(&mut self.store, dir).inspect_err(|err| log_failure("import", dir, err))
    }
}
