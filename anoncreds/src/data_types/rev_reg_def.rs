use super::{Curve, Scalar};
use cks_accumulator::setup::{AccumulatorPublicKey, RegistrySecretKey};
use serde::{Deserialize, Serialize};

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryType {
    CL_ACCUM,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinition {
    pub issuer_id: String,
    pub revoc_def_type: RegistryType,
    pub tag: String,
    pub cred_def_id: String,
    pub value: RevocationRegistryDefinitionValue,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionValue {
    pub max_cred_num: u32,
    pub public_keys: RevocationRegistryDefinitionValuePublicKeys,
    /// Hex encoded SHA-256 of the tails
    pub tails_hash: String,
    /// Where the issuer publishes the tails, opaque to this crate
    pub tails_location: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionValuePublicKeys {
    pub accum_key: AccumulatorPublicKey<Curve>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionPrivate {
    pub value: RegistrySecretKey<Scalar>,
}

impl RevocationRegistryDefinition {
    pub fn max_cred_num(&self) -> u32 {
        self.value.max_cred_num
    }

    pub fn accum_key(&self) -> &AccumulatorPublicKey<Curve> {
        &self.value.public_keys.accum_key
    }
}
