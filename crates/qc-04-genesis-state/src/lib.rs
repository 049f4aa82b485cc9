//! # qc-04-genesis-state
//!
//! Genesis export/import for the contract-state module of Quantum-Chain.
//!
//! ## Role in System
//!
//! - **Export**: Streams every contract account (code + storage) of a live
//!   store into framed part files, rolling over to a new part once the
//!   current one passes a size threshold
//! - **Import**: Reads those parts back, checks every record against the
//!   live account registry, and replays code and storage into the store
//!
//! ## Part File Layout
//!
//! ```text
//! ┌──────────┬────────────────┬────────────┬──────────┬─────────────┬─────
//! │ len (u32)│ params payload │ count (u64)│ len (u32)│ account 0   │ ...
//! └──────────┴────────────────┴────────────┴──────────┴─────────────┴─────
//!   little endian             patched after the full pass
//! ```
//!
//! A part whose count is still zero while records follow comes from an
//! export that never completed and is rejected on import.
//!
//! ## Layout
//!
//! - `domain`: Entities, config, errors and the per-account replay rules
//! - `ports`: Store traits, execution context, public API
//! - `codec`: Length-prefixed framing
//! - `adapters`: Bincode payload codec, in-memory ledger
//! - `service`: Export/import pipelines and the fee market genesis

pub mod adapters;
pub mod codec;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::*;
