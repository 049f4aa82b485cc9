//! # Genesis Round Trip Tests (qc-04)
//!
//! Drive the public API the way a node does at shutdown and at chain start.
//!
//! ## Test Categories
//!
//! 1. **Round Trip** - Export a ledger, import it into a fresh one
//! 2. **Shutdown** - Cancellation raised by another component mid-export
//! 3. **Store Failures** - Errors raised by the store stop the export

use std::cell::Cell;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use qc_04_genesis_state::codec::FrameReader;
use qc_04_genesis_state::{
    export_genesis_to, init_genesis_from, Account, AccountRegistry, Address, ContractStore,
    Deadline, GenesisConfig, GenesisError, GenesisService, GenesisStateApi, Hash, InMemoryLedger,
    NeverCancel, Params, ParamsStore, StorageKey, StorageValue, StoreError,
};

// =============================================================================
// TEST HELPERS
// =============================================================================

fn contract_code(seed: u8) -> Vec<u8> {
    vec![0x60, seed, 0x60, 0x00, 0x55, 0x60, seed, 0x60, 0x01, 0x55, 0x00]
}

fn populated_ledger(accounts: u8) -> InMemoryLedger {
    let mut ledger = InMemoryLedger::new();
    for i in 0..accounts {
        let storage: Vec<(StorageKey, StorageValue)> =
            (0..i % 4).map(|slot| ([slot; 32], [i; 32])).collect();
        ledger.insert_contract([i + 1; 20], &contract_code(i), &storage);
    }
    ledger
}

/// Fresh ledger knowing the same accounts but none of their code or storage.
fn bare_copy(source: &InMemoryLedger) -> InMemoryLedger {
    let mut target = InMemoryLedger::new();
    source
        .iterate_accounts(&mut |account| {
            target.insert_account(account.clone());
            ControlFlow::Continue(())
        })
        .unwrap();
    target
}

fn part_count(path: &Path) -> u64 {
    let bytes = std::fs::read(path).unwrap();
    let mut reader = FrameReader::new(&bytes);
    reader.read_record().unwrap();
    reader.read_count().unwrap()
}

/// Store that raises a shutdown flag after a number of storage reads.
struct ShutdownAfter {
    inner: InMemoryLedger,
    reads_left: Cell<usize>,
    flag: Arc<AtomicBool>,
}

impl ContractStore for ShutdownAfter {
    fn get_code(&self, code_hash: &Hash) -> Result<Vec<u8>, StoreError> {
        self.inner.get_code(code_hash)
    }

    fn set_code(&mut self, code_hash: Hash, code: &[u8]) -> Result<(), StoreError> {
        self.inner.set_code(code_hash, code)
    }

    fn get_storage(
        &self,
        address: &Address,
    ) -> Result<Vec<(StorageKey, StorageValue)>, StoreError> {
        let left = self.reads_left.get();
        if left == 0 {
            self.flag.store(true, Ordering::Release);
        } else {
            self.reads_left.set(left - 1);
        }
        self.inner.get_storage(address)
    }

    fn set_storage_value(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StoreError> {
        self.inner.set_storage_value(address, key, value)
    }
}

impl AccountRegistry for ShutdownAfter {
    fn iterate_accounts(
        &self,
        visit: &mut dyn FnMut(&Account) -> ControlFlow<GenesisError>,
    ) -> Result<(), GenesisError> {
        self.inner.iterate_accounts(visit)
    }

    fn resolve_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        self.inner.resolve_account(address)
    }

    fn module_account(&self, name: &str) -> Result<Option<Address>, StoreError> {
        self.inner.module_account(name)
    }
}

impl ParamsStore for ShutdownAfter {
    fn get_params(&self) -> Result<Params, StoreError> {
        self.inner.get_params()
    }

    fn set_params(&mut self, params: Params) -> Result<(), StoreError> {
        self.inner.set_params(params)
    }
}

/// Registry whose backing database fails half-way through iteration.
struct BrokenRegistry {
    inner: InMemoryLedger,
    fail_at: usize,
}

impl ContractStore for BrokenRegistry {
    fn get_code(&self, code_hash: &Hash) -> Result<Vec<u8>, StoreError> {
        self.inner.get_code(code_hash)
    }

    fn set_code(&mut self, code_hash: Hash, code: &[u8]) -> Result<(), StoreError> {
        self.inner.set_code(code_hash, code)
    }

    fn get_storage(
        &self,
        address: &Address,
    ) -> Result<Vec<(StorageKey, StorageValue)>, StoreError> {
        self.inner.get_storage(address)
    }

    fn set_storage_value(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StoreError> {
        self.inner.set_storage_value(address, key, value)
    }
}

impl AccountRegistry for BrokenRegistry {
    fn iterate_accounts(
        &self,
        visit: &mut dyn FnMut(&Account) -> ControlFlow<GenesisError>,
    ) -> Result<(), GenesisError> {
        let mut seen = 0;
        self.inner.iterate_accounts(&mut |account| {
            if seen == self.fail_at {
                return ControlFlow::Break(
                    StoreError::DatabaseError("iterator invalidated".into()).into(),
                );
            }
            seen += 1;
            visit(account)
        })
    }

    fn resolve_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        self.inner.resolve_account(address)
    }

    fn module_account(&self, name: &str) -> Result<Option<Address>, StoreError> {
        self.inner.module_account(name)
    }
}

impl ParamsStore for BrokenRegistry {
    fn get_params(&self) -> Result<Params, StoreError> {
        self.inner.get_params()
    }

    fn set_params(&mut self, params: Params) -> Result<(), StoreError> {
        self.inner.set_params(params)
    }
}

// =============================================================================
// ROUND TRIP
// =============================================================================

#[test]
fn test_chain_restart_restores_every_contract() {
    let dir = tempfile::tempdir().unwrap();
    let source = populated_ledger(40);
    let config = GenesisConfig::for_testing(2_048);

    let exported = export_genesis_to(&source, dir.path(), &config, &NeverCancel).unwrap();
    assert!(exported.parts.len() > 1);
    assert_eq!(exported.accounts, 40);
    for part in &exported.parts {
        assert_eq!(part_count(&part.path), part.records);
    }

    let mut target = bare_copy(&source);
    let imported = init_genesis_from(&mut target, dir.path(), &config).unwrap();

    assert_eq!(imported.files, exported.files());
    assert_eq!(imported.accounts_applied, 40);
    for i in 0..40u8 {
        let address = [i + 1; 20];
        assert_eq!(
            target.get_storage(&address).unwrap(),
            source.get_storage(&address).unwrap()
        );
        let hash = target.resolve_account(&address).unwrap().unwrap().code_hash().unwrap();
        assert_eq!(target.get_code(&hash).unwrap(), contract_code(i));
    }
}

#[test]
fn test_service_round_trip_with_custom_base_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenesisConfig::for_testing(1_024).with_file_base_name("evm-state");
    let source = GenesisService::new(populated_ledger(12), config.clone());

    let exported = source.export_genesis(dir.path(), &NeverCancel).unwrap();
    assert!(exported.parts[0].path.ends_with("evm-state0"));

    let mut target = GenesisService::new(bare_copy(source.store()), config);
    let imported = target.init_genesis(dir.path()).unwrap();

    assert_eq!(imported.accounts_applied, 12);
    assert_eq!(target.store().params(), source.store().params());
}

// =============================================================================
// SHUTDOWN
// =============================================================================

#[test]
fn test_shutdown_flag_stops_export() {
    let dir = tempfile::tempdir().unwrap();
    let flag = Arc::new(AtomicBool::new(false));
    let store = ShutdownAfter {
        inner: populated_ledger(10),
        reads_left: Cell::new(3),
        flag: Arc::clone(&flag),
    };

    let result = export_genesis_to(&store, dir.path(), &GenesisConfig::default(), &flag);

    assert!(matches!(result, Err(GenesisError::Terminated)));
    assert_eq!(part_count(&dir.path().join("genesis0")), 0);

    let mut target = bare_copy(&store.inner);
    let import = init_genesis_from(&mut target, dir.path(), &GenesisConfig::default());
    assert!(import.unwrap_err().is_integrity());
}

#[test]
fn test_expired_deadline_stops_export() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Deadline::new(NeverCancel, Instant::now() - Duration::from_millis(1));

    let result =
        export_genesis_to(&populated_ledger(3), dir.path(), &GenesisConfig::default(), &ctx);

    assert!(result.unwrap_err().is_terminated());
}

#[test]
fn test_distant_deadline_lets_export_finish() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = Deadline::new(NeverCancel, Instant::now() + Duration::from_secs(3_600));

    let summary =
        export_genesis_to(&populated_ledger(3), dir.path(), &GenesisConfig::default(), &ctx)
            .unwrap();

    assert_eq!(summary.accounts, 3);
}

// =============================================================================
// STORE FAILURES
// =============================================================================

#[test]
fn test_registry_failure_aborts_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = BrokenRegistry {
        inner: populated_ledger(6),
        fail_at: 4,
    };

    let result = export_genesis_to(&store, dir.path(), &GenesisConfig::default(), &NeverCancel);

    assert!(matches!(
        result,
        Err(GenesisError::Store(StoreError::DatabaseError(_)))
    ));
    assert_eq!(part_count(&dir.path().join("genesis0")), 0);
}
