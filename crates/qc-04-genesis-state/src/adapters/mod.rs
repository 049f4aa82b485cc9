//! # Adapters Module
//!
//! - `memory_db`: in-memory ledger implementing every store port
//! - `serializer`: record payload codecs

pub mod memory_db;
pub mod serializer;

pub use memory_db::{module_address, InMemoryLedger};
pub use serializer::BincodePayloadCodec;
