//! Issuer and holder setups for AnonCreds tests. Credential definitions use the fixed safe primes
//! of [`crate::primes`].

use crate::primes::{SAFE_PRIME_1024_P, SAFE_PRIME_1024_P2, SAFE_PRIME_1024_Q, SAFE_PRIME_1024_Q2};
use anoncreds::{data_types::Curve, prelude::*};
use ark_std::rand::RngCore;
use num_bigint::BigUint;
use std::str::FromStr;

pub const GVT_ATTRIBUTES: [&str; 4] = ["name", "age", "sex", "height"];

pub struct Registry {
    pub id: String,
    pub def: RevocationRegistryDefinition,
    pub def_private: RevocationRegistryDefinitionPrivate,
    pub tails: Tails<Curve>,
    /// Latest version of the status list
    pub status_list: RevocationStatusList,
}

pub struct Issuer {
    pub id: String,
    pub schema_id: String,
    pub schema: Schema,
    pub cred_def_id: String,
    pub cred_def: CredentialDefinition,
    pub cred_def_private: CredentialDefinitionPrivate,
    pub key_correctness_proof: CredentialKeyCorrectnessProof,
    pub registry: Option<Registry>,
}

fn primes(second: bool) -> (BigUint, BigUint) {
    let (p, q) = if second {
        (SAFE_PRIME_1024_P2, SAFE_PRIME_1024_Q2)
    } else {
        (SAFE_PRIME_1024_P, SAFE_PRIME_1024_Q)
    };
    (BigUint::from_str(p).unwrap(), BigUint::from_str(q).unwrap())
}

/// Issuer named `name` of credentials with `attributes`. With `max_cred_num`, the credential
/// definition supports revocation and a registry of that capacity is created with its status
/// list at `timestamp`.
pub fn setup_issuer<R: RngCore>(
    rng: &mut R,
    name: &str,
    attributes: &[&str],
    max_cred_num: Option<u32>,
    timestamp: u64,
    second_primes: bool,
) -> Issuer {
    let id = format!("did:example:{}", name);
    let schema_id = format!("{}/schema/{}/1.0", id, name);
    let cred_def_id = format!("{}/creddef/{}", id, name);
    let schema = create_schema(name, "1.0", &id, attributes.into()).unwrap();
    let (p, q) = primes(second_primes);
    let (cred_def, cred_def_private, key_correctness_proof) =
        create_credential_definition_with_safe_primes(
            rng,
            &schema_id,
            &schema,
            &id,
            "default",
            SignatureType::CL,
            max_cred_num.is_some(),
            &p,
            &q,
        )
        .unwrap();
    let registry = max_cred_num.map(|max| {
        let rev_reg_id = format!("{}/revreg/{}", id, name);
        let (def, def_private, tails) = create_revocation_registry_def(
            rng,
            &cred_def,
            &cred_def_id,
            "default",
            RegistryType::CL_ACCUM,
            max,
            "/tmp/tails",
        )
        .unwrap();
        let status_list = create_revocation_status_list(&rev_reg_id, &def, timestamp).unwrap();
        Registry {
            id: rev_reg_id,
            def,
            def_private,
            tails,
            status_list,
        }
    });
    Issuer {
        id,
        schema_id,
        schema,
        cred_def_id,
        cred_def,
        cred_def_private,
        key_correctness_proof,
        registry,
    }
}

impl Issuer {
    /// Runs offer, request, issuance and processing for a holder with `link_secret`. A revocable
    /// credential is issued in the status list version at `timestamp`.
    pub fn issue<R: RngCore>(
        &mut self,
        rng: &mut R,
        link_secret: &LinkSecret,
        values: &[(&str, &str)],
        timestamp: u64,
    ) -> Credential {
        let offer = create_credential_offer(
            rng,
            &self.schema_id,
            &self.cred_def_id,
            &self.key_correctness_proof,
        )
        .unwrap();
        let (request, metadata) = create_credential_request(
            rng,
            Some("holder entropy"),
            None,
            &self.cred_def,
            link_secret,
            "default",
            &offer,
        )
        .unwrap();
        let mut raw = MakeCredentialValues::default();
        for (name, value) in values {
            raw.add_raw(*name, *value);
        }
        let revocation = self
            .registry
            .as_mut()
            .map(|r| CredentialRevocationConfig {
                reg_def: &r.def,
                reg_def_private: &r.def_private,
                status_list: &mut r.status_list,
                tails: &r.tails,
                timestamp,
            });
        let mut credential = create_credential(
            rng,
            &self.cred_def,
            &self.cred_def_private,
            &offer,
            &request,
            raw.into(),
            revocation,
        )
        .unwrap();
        process_credential(
            &mut credential,
            &metadata,
            link_secret,
            &self.cred_def,
            self.registry.as_ref().map(|r| &r.def),
        )
        .unwrap();
        credential
    }

    pub fn registry(&self) -> &Registry {
        self.registry.as_ref().unwrap()
    }

    /// Revokes `revoked` and issues again `issued` in a new status list version at `timestamp`,
    /// returning that version
    pub fn update_registry(
        &mut self,
        issued: &[u32],
        revoked: &[u32],
        timestamp: u64,
    ) -> RevocationStatusList {
        let registry = self.registry.as_mut().unwrap();
        update_revocation_status_list(
            &mut registry.status_list,
            &registry.def,
            &registry.tails,
            &issued.iter().copied().collect(),
            &revoked.iter().copied().collect(),
            timestamp,
        )
        .unwrap();
        registry.status_list.clone()
    }
}

/// Values of a GVT credential
pub fn gvt_values<'a>(name: &'a str, age: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![("name", name), ("age", age), ("sex", "female"), ("height", "175")]
}
