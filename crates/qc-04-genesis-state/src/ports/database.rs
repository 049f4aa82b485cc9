use std::ops::ControlFlow;

use primitive_types::U256;

use crate::domain::{
    Account, Address, FeeMarketParams, GenesisAccount, GenesisError, Hash, Params,
    SerializationError, StorageKey, StorageValue, StoreError,
};

/// Code and storage slots of contract accounts.
pub trait ContractStore {
    /// Bytecode stored under `code_hash`. The empty code hash resolves to
    /// empty code.
    fn get_code(&self, code_hash: &Hash) -> Result<Vec<u8>, StoreError>;

    fn set_code(&mut self, code_hash: Hash, code: &[u8]) -> Result<(), StoreError>;

    /// Every storage slot of `address`, in store order.
    fn get_storage(
        &self,
        address: &Address,
    ) -> Result<Vec<(StorageKey, StorageValue)>, StoreError>;

    fn set_storage_value(
        &mut self,
        address: &Address,
        key: StorageKey,
        value: StorageValue,
    ) -> Result<(), StoreError>;
}

/// Account enumeration and address resolution.
pub trait AccountRegistry {
    /// Visit every account in registry order.
    ///
    /// The visitor stops iteration by breaking with an error, which is
    /// returned as-is.
    fn iterate_accounts(
        &self,
        visit: &mut dyn FnMut(&Account) -> ControlFlow<GenesisError>,
    ) -> Result<(), GenesisError>;

    fn resolve_account(&self, address: &Address) -> Result<Option<Account>, StoreError>;

    /// Address of the account registered for module `name`, if any.
    fn module_account(&self, name: &str) -> Result<Option<Address>, StoreError>;
}

/// Contract-state module parameters.
pub trait ParamsStore {
    fn get_params(&self) -> Result<Params, StoreError>;
    fn set_params(&mut self, params: Params) -> Result<(), StoreError>;
}

/// Everything the contract-state pipelines need from the store.
pub trait GenesisStateStore: ContractStore + AccountRegistry + ParamsStore {}

impl<T: ContractStore + AccountRegistry + ParamsStore + ?Sized> GenesisStateStore for T {}

/// Fee market module state.
pub trait FeeMarketKeeper {
    fn get_fee_market_params(&self) -> Result<FeeMarketParams, StoreError>;
    fn set_fee_market_params(&mut self, params: FeeMarketParams) -> Result<(), StoreError>;

    /// `None` until a base fee has been set.
    fn get_base_fee(&self) -> Result<Option<U256>, StoreError>;
    fn set_base_fee(&mut self, base_fee: U256) -> Result<(), StoreError>;

    fn get_block_gas_used(&self) -> Result<u64, StoreError>;
    fn set_block_gas_used(&mut self, gas: u64) -> Result<(), StoreError>;
}

/// Encoding of the payload carried inside one framed record.
pub trait PayloadCodec: Send + Sync {
    fn encode_params(&self, params: &Params) -> Result<Vec<u8>, SerializationError>;
    fn decode_params(&self, data: &[u8]) -> Result<Params, SerializationError>;

    fn encode_account(&self, account: &GenesisAccount) -> Result<Vec<u8>, SerializationError>;
    fn decode_account(&self, data: &[u8]) -> Result<GenesisAccount, SerializationError>;
}
