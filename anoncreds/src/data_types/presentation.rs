use super::{nonce::Nonce, Curve};
use anoncreds_utils::{bn::to_bytes, hashing_utils::hash_to_int, serde_utils::DecimalString};
use cks_accumulator::proof::NonRevocProof;
use cl_signatures::proof::PrimaryProof;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use sha2::Sha256;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub proof: Proof,
    pub requested_proof: RequestedProof,
    /// One per sub-proof, in the same order
    pub identifiers: Vec<Identifier>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub proofs: Vec<SubProof>,
    pub aggregated_proof: AggregatedProof,
}

/// Proof about one credential
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProof {
    pub primary_proof: PrimaryProof,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoc_proof: Option<NonRevocProof<Curve>>,
}

/// The challenge shared by all sub-proofs and the public values it was computed over
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedProof {
    #[serde_as(as = "DecimalString")]
    pub c_hash: BigUint,
    pub c_list: Vec<Vec<u8>>,
}

impl AggregatedProof {
    /// Challenge shared by all sub-proofs, SHA-256 of every tau, then every c list entry, then the
    /// request's nonce
    pub fn challenge(tau_list: &[Vec<u8>], c_list: &[Vec<u8>], nonce: &Nonce) -> BigUint {
        let nonce = to_bytes(nonce.as_int());
        hash_to_int::<Sha256, _, _>(
            tau_list
                .iter()
                .chain(c_list)
                .map(|b| b.as_slice())
                .chain([nonce.as_slice()]),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedProof {
    #[serde(default)]
    pub revealed_attrs: BTreeMap<String, RevealedAttributeInfo>,
    #[serde(default)]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroupInfo>,
    #[serde(default)]
    pub self_attested_attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    #[serde(default)]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeInfo {
    pub sub_proof_index: u32,
    pub raw: String,
    pub encoded: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeGroupInfo {
    pub sub_proof_index: u32,
    /// Keyed by the requested names
    pub values: BTreeMap<String, super::credential::AttributeValues>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProofReferent {
    pub sub_proof_index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub schema_id: String,
    pub cred_def_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev_reg_id: Option<String>,
    /// Version of the status list the non-revocation proof is against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}
