//! # State Replay
//!
//! Stateless helpers used by both directions: keccak code hashing, hex
//! conversions for addresses/hashes/code, and pushing one decoded record
//! into the store.
//!
//! ## Write Ordering
//!
//! A record is fully checked (hex decoded, code hash compared) before the
//! first write. A rejected or skipped account leaves no code and no storage
//! behind.

use sha3::{Digest, Keccak256};

use super::config::CodeHashMismatchPolicy;
use super::entities::{Address, DecodedAccount, Hash};
use super::errors::{GenesisError, HexError, IntegrityError};
use crate::ports::ContractStore;

/// Keccak256 digest of `data`.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

pub fn encode_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

pub fn encode_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Code is written without a `0x` prefix.
pub fn encode_code(code: &[u8]) -> String {
    hex::encode(code)
}

pub fn decode_address(text: &str) -> Result<Address, HexError> {
    decode_fixed::<20>(text)
}

pub fn decode_hash(text: &str) -> Result<Hash, HexError> {
    decode_fixed::<32>(text)
}

pub fn decode_code(text: &str) -> Result<Vec<u8>, HexError> {
    Ok(hex::decode(strip_prefix(text))?)
}

fn decode_fixed<const N: usize>(text: &str) -> Result<[u8; N], HexError> {
    let bytes = hex::decode(strip_prefix(text))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| HexError::InvalidLength {
        expected: N,
        actual,
    })
}

fn strip_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Account left out of an import under `CodeHashMismatchPolicy::Skip`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedAccount {
    pub address: Address,
    /// Position of the record in the import sequence.
    pub index: u64,
    /// Code hash recorded in the store.
    pub expected: Hash,
    /// Hash of the exported code.
    pub actual: Hash,
}

/// Result of replaying one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayOutcome {
    Applied { storage_slots: usize },
    Skipped(SkippedAccount),
}

/// Replay one decoded record into `store`.
///
/// `expected` is the code hash recorded for the live account and `index` the
/// record's position in the import sequence.
pub fn replay_account<S>(
    store: &mut S,
    account: &DecodedAccount,
    expected: Hash,
    index: u64,
    policy: CodeHashMismatchPolicy,
) -> Result<ReplayOutcome, GenesisError>
where
    S: ContractStore + ?Sized,
{
    let actual = keccak256(&account.code);
    if actual != expected {
        return match policy {
            CodeHashMismatchPolicy::Abort => Err(IntegrityError::CodeHashMismatch {
                address: account.address,
                index,
                expected,
                actual,
            }
            .into()),
            CodeHashMismatchPolicy::Skip => Ok(ReplayOutcome::Skipped(SkippedAccount {
                address: account.address,
                index,
                expected,
                actual,
            })),
        };
    }

    store.set_code(actual, &account.code)?;
    for (key, value) in &account.storage {
        store.set_storage_value(&account.address, *key, *value)?;
    }

    Ok(ReplayOutcome::Applied {
        storage_slots: account.storage.len(),
    })
}
