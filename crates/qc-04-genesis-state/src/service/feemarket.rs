//! # Fee Market Genesis
//!
//! Whole-buffer export/import of the fee market module: parameters, base
//! fee and block gas, as one JSON document in `genesis_feemarket.bin`.

use std::fs;
use std::path::{Path, PathBuf};

use primitive_types::U256;

use super::exporter::write_whole_file;
use super::importer::read_whole_file;
use crate::domain::{module_file_name, FeeMarketGenesis, GenesisError, FEE_MARKET_MODULE_NAME};
use crate::ports::FeeMarketKeeper;

/// Snapshot the fee market state. An unset base fee exports as zero.
pub fn export_fee_market<K: FeeMarketKeeper + ?Sized>(
    keeper: &K,
) -> Result<FeeMarketGenesis, GenesisError> {
    Ok(FeeMarketGenesis {
        params: keeper.get_fee_market_params()?,
        base_fee: keeper.get_base_fee()?.unwrap_or_else(U256::zero),
        block_gas: keeper.get_block_gas_used()?,
    })
}

/// Apply a fee market genesis to the keeper.
pub fn init_fee_market<K: FeeMarketKeeper + ?Sized>(
    keeper: &mut K,
    genesis: FeeMarketGenesis,
) -> Result<(), GenesisError> {
    keeper.set_fee_market_params(genesis.params)?;
    keeper.set_base_fee(genesis.base_fee)?;
    keeper.set_block_gas_used(genesis.block_gas)?;
    Ok(())
}

/// Write the fee market genesis into `dir`. Returns the file written.
pub fn export_fee_market_to<K: FeeMarketKeeper + ?Sized>(
    keeper: &K,
    dir: &Path,
) -> Result<PathBuf, GenesisError> {
    fs::create_dir_all(dir).map_err(|e| GenesisError::io(dir, e))?;

    let path = dir.join(module_file_name(FEE_MARKET_MODULE_NAME));
    let genesis = export_fee_market(keeper)?;
    let bytes = serde_json::to_vec(&genesis).map_err(|e| GenesisError::encoding(&path, 0, e))?;
    write_whole_file(&path, &bytes)?;

    tracing::info!("[qc-04] Exported fee market genesis to {}", path.display());
    Ok(path)
}

/// Read `genesis_feemarket.bin` from `dir` and apply it.
pub fn init_fee_market_from<K: FeeMarketKeeper + ?Sized>(
    keeper: &mut K,
    dir: &Path,
) -> Result<FeeMarketGenesis, GenesisError> {
    let path = dir.join(module_file_name(FEE_MARKET_MODULE_NAME));
    let bytes = read_whole_file(&path)?;
    let genesis: FeeMarketGenesis =
        serde_json::from_slice(&bytes).map_err(|e| GenesisError::encoding(&path, 0, e))?;

    init_fee_market(keeper, genesis.clone())?;

    tracing::info!("[qc-04] Imported fee market genesis from {}", path.display());
    Ok(genesis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLedger;
    use crate::domain::FeeMarketParams;

    #[test]
    fn test_unset_base_fee_exports_as_zero() {
        let ledger = InMemoryLedger::new();
        let genesis = export_fee_market(&ledger).unwrap();

        assert_eq!(genesis.base_fee, U256::zero());
        assert_eq!(genesis.block_gas, 0);
    }

    #[test]
    fn test_fee_market_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = InMemoryLedger::new();
        source
            .set_fee_market_params(FeeMarketParams {
                no_base_fee: true,
                enable_height: 12,
                min_gas_price: U256::from(25u64),
                ..Default::default()
            })
            .unwrap();
        source.set_base_fee(U256::from(1_000_000_000u64)).unwrap();
        source.set_block_gas_used(21_000).unwrap();

        let path = export_fee_market_to(&source, dir.path()).unwrap();
        assert!(path.ends_with("genesis_feemarket.bin"));

        let mut target = InMemoryLedger::new();
        let imported = init_fee_market_from(&mut target, dir.path()).unwrap();

        assert_eq!(imported, export_fee_market(&source).unwrap());
        assert_eq!(target.get_base_fee().unwrap(), Some(U256::from(1_000_000_000u64)));
        assert_eq!(target.get_block_gas_used().unwrap(), 21_000);
        assert!(target.get_fee_market_params().unwrap().no_base_fee);
    }

    #[test]
    fn test_missing_fee_market_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut target = InMemoryLedger::new();

        let result = init_fee_market_from(&mut target, dir.path());
        assert!(matches!(result, Err(GenesisError::Io { .. })));
    }
}
