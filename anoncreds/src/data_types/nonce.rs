use anoncreds_utils::{bn::rand_bits, serde_utils::DecimalString};
use ark_std::rand::RngCore;
use cl_signatures::constants::NONCE_BITS;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::fmt;

/// 80 bit random number binding a response to the message it answers
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Nonce(#[serde_as(as = "DecimalString")] pub BigUint);

impl Nonce {
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self(rand_bits(rng, NONCE_BITS))
    }

    pub fn as_int(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
