use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;

use primitive_types::U256;

use crate::domain::{
    replay, Account, Address, FeeMarketParams, GenesisError, Hash, Params, StorageKey,
    StorageValue, StoreError, EMPTY_CODE_HASH, EVM_MODULE_NAME,
};
use crate::ports::{AccountRegistry, ContractStore, FeeMarketKeeper, ParamsStore};

/// Deterministic module account address: the first 20 bytes of
/// keccak256(module name).
pub fn module_address(name: &str) -> Address {
    let hash = replay::keccak256(name.as_bytes());
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[..20]);
    address
}

/// In-memory ledger implementing every store port.
///
/// Registry order is insertion order. Storage is kept sorted by key so
/// `get_storage` is deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    accounts: Vec<Account>,
    index: HashMap<Address, usize>,
    modules: HashMap<String, Address>,
    code: HashMap<Hash, Vec<u8>>,
    storage: HashMap<Address, BTreeMap<StorageKey, StorageValue>>,
    params: Params,
    fee_market_params: FeeMarketParams,
    base_fee: Option<U256>,
    block_gas_used: u64,
}

impl InMemoryLedger {
    /// Ledger with the contract-state module account registered.
    pub fn new() -> Self {
        let mut ledger = Self::empty();
        ledger.register_module(EVM_MODULE_NAME);
        ledger
    }

    /// Ledger without any accounts.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register a module account and return its address.
    pub fn register_module(&mut self, name: &str) -> Address {
        let address = module_address(name);
        self.insert_account(Account::module(address, name));
        self.modules.insert(name.to_string(), address);
        address
    }

    /// Insert or replace a registry account. Replacing keeps its position.
    pub fn insert_account(&mut self, account: Account) {
        match self.index.get(&account.address) {
            Some(&pos) => self.accounts[pos] = account,
            None => {
                self.index.insert(account.address, self.accounts.len());
                self.accounts.push(account);
            }
        }
    }

    /// Register a contract account with its code and storage.
    pub fn insert_contract(
        &mut self,
        address: Address,
        code: &[u8],
        storage: &[(StorageKey, StorageValue)],
    ) -> Hash {
        let code_hash = replay::keccak256(code);
        self.insert_account(Account::contract(address, code_hash));
        if !code.is_empty() {
            self.code.insert(code_hash, code.to_vec());
        }
        let slots = self.storage.entry(address).or_default();
        for (key, value) in storage {
            slots.insert(*key, *value);
        }
        code_hash
    }

    /// Register a contract account that has no code or storage stored yet.
    pub fn insert_empty_contract(&mut self, address: Address, code_hash: Hash) {
        self.insert_account(Account::contract(address, code_hash));
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

impl ContractStore for InMemoryLedger {
    fn get_code(&self, code_hash: &Hash) -> Result<Vec<u8>, StoreError> {
        if *code_hash == EMPTY_CODE_HASH {
            return Ok(Vec::new());
        }
        self.code
            .get(code_hash)
            .cloned()
            .ok_or(StoreError::CodeNotFound(*code_hash))
    }

    fn set_code(&mut self, code_hash: Hash, code: &[u8]) -> Result<(), StoreError> {
        if code.is_empty() {
            self.code.remove(&code_hash);
        } else {
            self.code.insert(code_hash, code.to_vec());
        }
        Ok(())
    }

    fn get_storage(
        &self,
        address: &Address,
    ) -> Result<Vec<(StorageKey, StorageValue)>, StoreError> {
        Ok(self
            .storage
            .get(address)
            .map(|slots| slots.iter().map(|(k, v)| (*k, *v)).collect())
            .unwrap_or_default())
    }

    fn set_storage_value(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StoreError> {
        self.storage.entry(*address).or_default().insert(key, value);
        Ok(())
    }
}

impl AccountRegistry for InMemoryLedger {
    fn iterate_accounts(
        &self,
        visit: &mut dyn FnMut(&Account) -> ControlFlow<GenesisError>,
    ) -> Result<(), GenesisError> {
        for account in &self.accounts {
            if let ControlFlow::Break(err) = visit(account) {
                return Err(err);
            }
        }
        Ok(())
    }

    fn resolve_account(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        Ok(self
            .index
            .get(address)
            .map(|&pos| self.accounts[pos].clone()))
    }

    fn module_account(&self, name: &str) -> Result<Option<Address>, StoreError> {
        Ok(self.modules.get(name).copied())
    }
}

impl ParamsStore for InMemoryLedger {
    fn get_params(&self) -> Result<Params, StoreError> {
        Ok(self.params.clone())
    }

    fn set_params(&mut self, params: Params) -> Result<(), StoreError> {
        self.params = params;
        Ok(())
    }
}

impl FeeMarketKeeper for InMemoryLedger {
    fn get_fee_market_params(&self) -> Result<FeeMarketParams, StoreError> {
        Ok(self.fee_market_params.clone())
    }

    fn set_fee_market_params(&mut self, params: FeeMarketParams) -> Result<(), StoreError> {
        self.fee_market_params = params;
        Ok(())
    }

    fn get_base_fee(&self) -> Result<Option<U256>, StoreError> {
        Ok(self.base_fee)
    }

    fn set_base_fee(&mut self, base_fee: U256) -> Result<(), StoreError> {
        self.base_fee = Some(base_fee);
        Ok(())
    }

    fn get_block_gas_used(&self) -> Result<u64, StoreError> {
        Ok(self.block_gas_used)
    }

    fn set_block_gas_used(&mut self, gas: u64) -> Result<(), StoreError> {
        self.block_gas_used = gas;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_insertion_order() {
        let mut ledger = InMemoryLedger::empty();
        ledger.insert_account(Account::base([3; 20]));
        ledger.insert_contract([1; 20], &[0x60], &[]);
        ledger.insert_account(Account::base([2; 20]));

        let mut seen = Vec::new();
        ledger
            .iterate_accounts(&mut |account| {
                seen.push(account.address);
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(seen, vec![[3; 20], [1; 20], [2; 20]]);
    }

    #[test]
    fn test_iteration_stops_on_break() {
        let mut ledger = InMemoryLedger::empty();
        ledger.insert_account(Account::base([1; 20]));
        ledger.insert_account(Account::base([2; 20]));

        let mut visits = 0;
        let result = ledger.iterate_accounts(&mut |_| {
            visits += 1;
            ControlFlow::Break(GenesisError::Terminated)
        });

        assert!(matches!(result, Err(GenesisError::Terminated)));
        assert_eq!(visits, 1);
    }

    #[test]
    fn test_code_lookup() {
        let mut ledger = InMemoryLedger::new();
        let hash = ledger.insert_contract([1; 20], &[0x60, 0x01], &[]);

        assert_eq!(ledger.get_code(&hash).unwrap(), vec![0x60, 0x01]);
        assert!(ledger.get_code(&EMPTY_CODE_HASH).unwrap().is_empty());
        assert!(matches!(
            ledger.get_code(&[0x77; 32]),
            Err(StoreError::CodeNotFound(_))
        ));
    }

    #[test]
    fn test_module_account_registration() {
        let ledger = InMemoryLedger::new();
        let address = ledger.module_account(EVM_MODULE_NAME).unwrap().unwrap();

        assert_eq!(address, module_address(EVM_MODULE_NAME));
        assert!(!ledger.resolve_account(&address).unwrap().unwrap().is_managed());
        assert_eq!(InMemoryLedger::empty().module_account(EVM_MODULE_NAME).unwrap(), None);
    }
}
