//! # Domain Entities for Genesis State
//!
//! Data exchanged between the live state store and genesis files.
//!
//! ## Type Decisions
//!
//! - Registry accounts carry an explicit `AccountKind` tag. Whether an account
//!   owns code and storage is answered by matching the tag, never by probing
//!   the store.
//! - `GenesisAccount` keeps its fields as hex text. This is the portable form
//!   written to disk; `GenesisAccount::decode` turns it back into raw bytes
//!   before anything touches the store.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::errors::HexError;
use super::replay;

pub type Hash = [u8; 32];
pub type Address = [u8; 20];
pub type StorageKey = [u8; 32];
pub type StorageValue = [u8; 32];

/// Keccak256 of the empty byte string.
/// Value: 0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470
pub const EMPTY_CODE_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Module name of the contract-state module.
pub const EVM_MODULE_NAME: &str = "evm";

/// Module name of the fee market module.
pub const FEE_MARKET_MODULE_NAME: &str = "feemarket";

// =============================================================================
// REGISTRY ACCOUNTS
// =============================================================================

/// Kind tag attached to every account in the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountKind {
    /// Account that owns bytecode and key/value storage.
    Contract { code_hash: Hash },
    /// Module-owned account (no code, no storage).
    Module { name: String },
    /// Plain account without contract capabilities.
    Base,
}

/// Account as seen through the account registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub kind: AccountKind,
}

impl Account {
    /// Contract account whose recorded code hash is `code_hash`.
    pub fn contract(address: Address, code_hash: Hash) -> Self {
        Self {
            address,
            kind: AccountKind::Contract { code_hash },
        }
    }

    /// Module account registered under `name`.
    pub fn module(address: Address, name: impl Into<String>) -> Self {
        Self {
            address,
            kind: AccountKind::Module { name: name.into() },
        }
    }

    pub fn base(address: Address) -> Self {
        Self {
            address,
            kind: AccountKind::Base,
        }
    }

    /// Recorded code hash, present only for contract accounts.
    pub fn code_hash(&self) -> Option<Hash> {
        match self.kind {
            AccountKind::Contract { code_hash } => Some(code_hash),
            _ => None,
        }
    }

    /// Whether this account carries code and storage managed by the module.
    pub fn is_managed(&self) -> bool {
        matches!(self.kind, AccountKind::Contract { .. })
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// Contract-state module parameters.
///
/// Exactly one instance per export. In the chunked format it is the first
/// record of every part.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Denomination used for gas fees.
    pub evm_denom: String,
    /// Contract creation enabled.
    pub enable_create: bool,
    /// Contract calls enabled.
    pub enable_call: bool,
    /// Additional activated EIPs.
    pub extra_eips: Vec<i64>,
    /// Chain ID used for replay protection.
    pub chain_id: u64,
    /// Accept transactions without replay protection.
    pub allow_unprotected_txs: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            evm_denom: "aqc".to_string(),
            enable_create: true,
            enable_call: true,
            extra_eips: Vec::new(),
            chain_id: 1,
            allow_unprotected_txs: false,
        }
    }
}

/// Fee market module parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketParams {
    /// Disable the base fee entirely.
    pub no_base_fee: bool,
    /// Bounds the base fee change between blocks.
    pub base_fee_change_denominator: u32,
    /// Bounds the block gas target.
    pub elasticity_multiplier: u32,
    /// Height at which the base fee calculation starts.
    pub enable_height: i64,
    /// Floor for accepted gas prices.
    pub min_gas_price: U256,
    /// Fraction of gas wanted charged as gas used, in basis points.
    pub min_gas_multiplier_bps: u32,
}

impl Default for FeeMarketParams {
    fn default() -> Self {
        Self {
            no_base_fee: false,
            base_fee_change_denominator: 8,
            elasticity_multiplier: 2,
            enable_height: 0,
            min_gas_price: U256::zero(),
            min_gas_multiplier_bps: 5_000,
        }
    }
}

/// Whole-buffer genesis of the fee market module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketGenesis {
    pub params: FeeMarketParams,
    /// Base fee at export time. Exported as zero when unset.
    pub base_fee: U256,
    /// Gas used by the last block.
    pub block_gas: u64,
}

// =============================================================================
// GENESIS RECORDS
// =============================================================================

/// One storage slot in hex form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisStorage {
    pub key: String,
    pub value: String,
}

/// Exported state of one contract account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// `0x`-prefixed address.
    pub address: String,
    /// Bytecode as unprefixed hex. Empty for accounts without code.
    pub code: String,
    /// Storage slots in store order.
    pub storage: Vec<GenesisStorage>,
}

impl GenesisAccount {
    pub fn new(address: &Address, code: &[u8], storage: &[(StorageKey, StorageValue)]) -> Self {
        Self {
            address: replay::encode_address(address),
            code: replay::encode_code(code),
            storage: storage
                .iter()
                .map(|(key, value)| GenesisStorage {
                    key: replay::encode_hash(key),
                    value: replay::encode_hash(value),
                })
                .collect(),
        }
    }

    /// Parse every hex field. Nothing is written to the store before this
    /// succeeds for the whole record.
    pub fn decode(&self) -> Result<DecodedAccount, HexError> {
        let address = replay::decode_address(&self.address)?;
        let code = replay::decode_code(&self.code)?;
        let storage = self
            .storage
            .iter()
            .map(|slot| Ok((replay::decode_hash(&slot.key)?, replay::decode_hash(&slot.value)?)))
            .collect::<Result<Vec<_>, HexError>>()?;

        Ok(DecodedAccount {
            address,
            code,
            storage,
        })
    }
}

/// Raw-byte view of a `GenesisAccount`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedAccount {
    pub address: Address,
    pub code: Vec<u8>,
    pub storage: Vec<(StorageKey, StorageValue)>,
}

/// Whole-buffer genesis of the contract-state module.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub accounts: Vec<GenesisAccount>,
}

impl GenesisState {
    pub fn new(params: Params) -> Self {
        Self {
            params,
            accounts: Vec::new(),
        }
    }
}
