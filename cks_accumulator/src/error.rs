use anoncreds_utils::{error::UtilsError, serde_utils::ArkSerializationError};
use ark_serialize::SerializationError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub enum RevocationError {
    /// Registry capacity must be in `[1, MAX_CRED_NUM]`
    InvalidMaxCredNum(u32),
    /// Registry index outside `[1, max_cred_num]`
    IndexOutOfRange(u32, u32),
    /// Tail at the given position doesn't exist
    TailNotFound(u32),
    /// Number of tails doesn't match the registry's capacity
    InvalidTailsCount(usize, u32),
    TailsHashMismatch,
    InvalidParams,
    InvalidPublicKey,
    /// Secret exponent makes the signature's denominator 0, signing should be retried
    ZeroDenominator,
    /// One of the pairing checks of a non-revocation signature and witness failed
    InvalidWitness,
    InvalidSignature,
    #[serde(with = "ArkSerializationError")]
    Serialization(SerializationError),
    UtilsError(UtilsError),
}

impl From<SerializationError> for RevocationError {
    fn from(e: SerializationError) -> Self {
        Self::Serialization(e)
    }
}

impl From<UtilsError> for RevocationError {
    fn from(e: UtilsError) -> Self {
        Self::UtilsError(e)
    }
}
