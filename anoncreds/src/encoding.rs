//! Encoding of raw attribute values into the integers that are signed.
//!
//! A raw value that is a non-negative 32 bit integer is encoded as itself so predicates can be
//! proven about it. Anything else is encoded as SHA-256 of its UTF-8 bytes read as a big-endian
//! integer.

use crate::error::Result;
use anoncreds_utils::hashing_utils::hash_to_int;
use num_bigint::BigUint;
use sha2::Sha256;
use std::str::FromStr;

pub fn encode_credential_attribute(raw: &str) -> String {
    match raw.parse::<i32>() {
        Ok(n) if n >= 0 => n.to_string(),
        _ => hash_to_int::<Sha256, _, _>([raw.as_bytes()]).to_string(),
    }
}

/// Integer of a decimal encoded value
pub fn encoded_to_int(encoded: &str) -> Result<BigUint> {
    BigUint::from_str(encoded)
        .map_err(|_| err_msg!(InvalidInput, "Encoded value {:?} is not a decimal integer", encoded))
}

/// Whether `encoded` is what `raw` encodes to. Encoded values given explicitly by the issuer
/// can't be checked this way.
pub fn is_encoding_of(raw: &str, encoded: &str) -> bool {
    encode_credential_attribute(raw) == encoded
}
