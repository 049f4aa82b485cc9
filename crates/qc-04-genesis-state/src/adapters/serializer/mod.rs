//! Serializer Adapters
//! 
//! Implementations of the `PayloadCodec` trait.

mod bincode;

pub use self::bincode::BincodePayloadCodec;
