use crate::error::Result;
use anoncreds_utils::{bn::rand_bits, serde_utils::DecimalString};
use ark_std::rand::RngCore;
use cl_signatures::constants::LINK_SECRET_BITS;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::{fmt, str::FromStr};

/// The holder's secret that all its credentials are bound to. Never leaves the holder.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkSecret(#[serde_as(as = "DecimalString")] pub(crate) BigUint);

impl LinkSecret {
    pub fn new<R: RngCore>(rng: &mut R) -> Self {
        Self(rand_bits(rng, LINK_SECRET_BITS))
    }

    /// Link secret from its decimal string
    pub fn from_value(value: &str) -> Result<Self> {
        BigUint::from_str(value)
            .map(Self)
            .map_err(|_| err_msg!(InvalidInput, "Link secret is not a decimal integer"))
    }

    pub fn value(&self) -> String {
        self.0.to_string()
    }

    pub(crate) fn as_int(&self) -> &BigUint {
        &self.0
    }
}

impl fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LinkSecret(****)")
    }
}
