use super::{attr_common_view, Curve};
use crate::{
    encoding::{encode_credential_attribute, encoded_to_int},
    error::Result,
};
use cks_accumulator::{accumulator::Accumulator, signature::NonRevocationSignature, witness::Witness};
use cl_signatures::signature::{PrimarySignature, SignatureCorrectnessProof};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub schema_id: String,
    pub cred_def_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
    /// Index of a revocable credential in its registry, the one its non-revocation signature is on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_index: Option<u32>,
    pub values: CredentialValues,
    pub signature: CredentialSignature,
    pub signature_correctness_proof: SignatureCorrectnessProof,
    /// Accumulator when the credential was issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg: Option<Accumulator<Curve>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness<Curve>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSignature {
    pub p_credential: PrimarySignature,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r_credential: Option<NonRevocationSignature<Curve>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValues {
    pub raw: String,
    pub encoded: String,
}

/// Attribute values keyed by the attribute names of the schema
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialValues(pub BTreeMap<String, AttributeValues>);

/// Builds [`CredentialValues`], encoding raw values unless an encoding is given
#[derive(Clone, Debug, Default)]
pub struct MakeCredentialValues(BTreeMap<String, AttributeValues>);

impl MakeCredentialValues {
    pub fn add_raw(&mut self, name: impl Into<String>, raw: impl Into<String>) -> &mut Self {
        let raw = raw.into();
        let encoded = encode_credential_attribute(&raw);
        self.0.insert(name.into(), AttributeValues { raw, encoded });
        self
    }

    pub fn add_encoded(
        &mut self,
        name: impl Into<String>,
        raw: impl Into<String>,
        encoded: impl Into<String>,
    ) -> &mut Self {
        self.0.insert(
            name.into(),
            AttributeValues {
                raw: raw.into(),
                encoded: encoded.into(),
            },
        );
        self
    }

    /// Values from raw values with optional explicit encodings for some of them
    pub fn from_raw(
        raw: &BTreeMap<String, String>,
        encoded: Option<&BTreeMap<String, String>>,
    ) -> Self {
        let mut values = Self::default();
        for (name, r) in raw {
            match encoded.and_then(|e| e.get(name)) {
                Some(e) => values.add_encoded(name, r, e),
                None => values.add_raw(name, r),
            };
        }
        values
    }

    pub fn into_values(self) -> CredentialValues {
        CredentialValues(self.0)
    }
}

impl From<MakeCredentialValues> for CredentialValues {
    fn from(m: MakeCredentialValues) -> Self {
        m.into_values()
    }
}

impl CredentialValues {
    /// Encoded values as integers keyed by the attributes' common view, as they are signed
    pub fn encoded_ints(&self) -> Result<BTreeMap<String, BigUint>> {
        self.0
            .iter()
            .map(|(k, v)| Ok((attr_common_view(k), encoded_to_int(&v.encoded)?)))
            .collect()
    }

    /// Value of the attribute whose common view is that of `name`
    pub fn get(&self, name: &str) -> Option<&AttributeValues> {
        let name = attr_common_view(name);
        self.0
            .iter()
            .find(|(k, _)| attr_common_view(k) == name)
            .map(|(_, v)| v)
    }
}
