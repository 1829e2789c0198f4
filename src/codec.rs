//! Wire codec contract (spec.md §6): `encode(T) -> bytes`, `decode(bytes) -> T`.

use crate::error::PipeError;

pub trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T) -> Result<Vec<u8>, PipeError>;
    fn decode(&self, bytes: &[u8]) -> Result<T, PipeError>;
}

/// The identity codec for raw byte payloads.
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>, PipeError> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, PipeError> {
        Ok(bytes.to_vec())
    }
}
