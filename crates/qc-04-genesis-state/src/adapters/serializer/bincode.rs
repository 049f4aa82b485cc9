use crate::domain::{GenesisAccount, Params, SerializationError};
use crate::ports::PayloadCodec;

/// Default record payload codec using bincode.
#[derive(Debug, Default, Clone, Copy)]
pub struct BincodePayloadCodec;

fn serialization_error(e: bincode::Error) -> SerializationError {
    SerializationError {
        message: e.to_string(),
    }
}

impl PayloadCodec for BincodePayloadCodec {
    fn encode_params(&self, params: &Params) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(params).map_err(serialization_error)
    }

    fn decode_params(&self, data: &[u8]) -> Result<Params, SerializationError> {
        bincode::deserialize(data).map_err(serialization_error)
    }

    fn encode_account(&self, account: &GenesisAccount) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(account).map_err(serialization_error)
    }

    fn decode_account(&self, data: &[u8]) -> Result<GenesisAccount, SerializationError> {
        bincode::deserialize(data).map_err(serialization_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_account_payload_is_rejected() {
        let codec = BincodePayloadCodec;
        assert!(codec.decode_account(&[0xFF, 0xFF, 0xFF]).is_err());
    }

    #[test]
    fn test_account_payload_decodes() {
        let codec = BincodePayloadCodec;
        let account = GenesisAccount::new(&[0x01; 20], &[0x60, 0x00], &[([3; 32], [4; 32])]);

        let bytes = codec.encode_account(&account).unwrap();
        assert_eq!(codec.decode_account(&bytes).unwrap(), account);
    }
}
