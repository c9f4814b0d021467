//! Operations of the issuer: publishing schemas, credential definitions and revocation
//! registries, issuing credentials and revoking them.

use crate::{
    data_types::{
        cred_def::{
            CredentialDefinition, CredentialDefinitionConfig, CredentialDefinitionData,
            CredentialDefinitionPrivate, CredentialKeyCorrectnessProof,
            CredentialRevocationPublicKey, SignatureType,
        },
        cred_offer::CredentialOffer,
        cred_request::CredentialRequest,
        credential::{Credential, CredentialSignature, CredentialValues},
        nonce::Nonce,
        rev_reg_def::{
            RegistryType, RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
            RevocationRegistryDefinitionValue, RevocationRegistryDefinitionValuePublicKeys,
        },
        rev_status_list::RevocationStatusList,
        schema::{AttributeNames, Schema},
        Curve, Scalar,
    },
    error::Result,
};
use anoncreds_utils::bn::int_from_field_elem;
use ark_ff::PrimeField;
use ark_std::rand::RngCore;
use cks_accumulator::{
    setup::{AccumulatorPublicKey, RegistrySecretKey, RevocationKeypair, RevocationParams},
    signature::NonRevocationSignature,
    tails::{Tails, TailsAccessor},
    witness::Witness,
};
use cl_signatures::{setup::PrimaryKeypair, signature::PrimarySignature};
use log::{debug, trace};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// What the issuer needs to issue a revocable credential. `status_list` is the latest version of
/// the registry's list and is updated with the credential's index on success.
pub struct CredentialRevocationConfig<'a, T: TailsAccessor<Curve>> {
    pub reg_def: &'a RevocationRegistryDefinition,
    pub reg_def_private: &'a RevocationRegistryDefinitionPrivate,
    pub status_list: &'a mut RevocationStatusList,
    pub tails: &'a T,
    /// Timestamp of the status list version that issues the credential
    pub timestamp: u64,
}

pub fn create_schema(
    name: &str,
    version: &str,
    issuer_id: &str,
    attr_names: AttributeNames,
) -> Result<Schema> {
    trace!(
        "create_schema: >>> name: {}, version: {}, attr_names: {:?}",
        name,
        version,
        attr_names
    );
    Schema::new(name, version, issuer_id, attr_names)
}

/// Keys for credentials of `schema`, generating the RSA safe primes, along with the proof that
/// the public key is correctly formed which the issuer puts in its offers
pub fn create_credential_definition<R: RngCore>(
    rng: &mut R,
    schema_id: &str,
    schema: &Schema,
    issuer_id: &str,
    tag: &str,
    signature_type: SignatureType,
    config: &CredentialDefinitionConfig,
) -> Result<(
    CredentialDefinition,
    CredentialDefinitionPrivate,
    CredentialKeyCorrectnessProof,
)> {
    trace!(
        "create_credential_definition: >>> schema_id: {}, tag: {}, config: {:?}",
        schema_id,
        tag,
        config
    );
    schema.validate()?;
    let attributes = schema.common_attr_names().into_iter().collect::<Vec<_>>();
    let (keypair, proof) = PrimaryKeypair::generate(rng, &attributes, &config.key)?;
    let res = build_credential_definition(
        rng,
        schema_id,
        issuer_id,
        tag,
        signature_type,
        config.support_revocation,
        keypair,
        proof,
    );
    trace!("create_credential_definition: <<<");
    Ok(res)
}

/// As [`create_credential_definition`] but with given safe primes `p_safe` and `q_safe`, the
/// expensive part of key generation
pub fn create_credential_definition_with_safe_primes<R: RngCore>(
    rng: &mut R,
    schema_id: &str,
    schema: &Schema,
    issuer_id: &str,
    tag: &str,
    signature_type: SignatureType,
    support_revocation: bool,
    p_safe: &BigUint,
    q_safe: &BigUint,
) -> Result<(
    CredentialDefinition,
    CredentialDefinitionPrivate,
    CredentialKeyCorrectnessProof,
)> {
    schema.validate()?;
    let attributes = schema.common_attr_names().into_iter().collect::<Vec<_>>();
    let (keypair, proof) =
        PrimaryKeypair::generate_with_safe_primes(rng, &attributes, p_safe, q_safe)?;
    Ok(build_credential_definition(
        rng,
        schema_id,
        issuer_id,
        tag,
        signature_type,
        support_revocation,
        keypair,
        proof,
    ))
}

fn build_credential_definition<R: RngCore>(
    rng: &mut R,
    schema_id: &str,
    issuer_id: &str,
    tag: &str,
    signature_type: SignatureType,
    support_revocation: bool,
    keypair: PrimaryKeypair,
    proof: CredentialKeyCorrectnessProof,
) -> (
    CredentialDefinition,
    CredentialDefinitionPrivate,
    CredentialKeyCorrectnessProof,
) {
    let (revocation_public, revocation_secret) = if support_revocation {
        let params = RevocationParams::<Curve>::generate_using_rng(rng);
        let RevocationKeypair {
            secret_key,
            public_key,
        } = RevocationKeypair::generate(rng, &params);
        (
            Some(CredentialRevocationPublicKey { params, public_key }),
            Some(secret_key),
        )
    } else {
        (None, None)
    };
    let PrimaryKeypair {
        public_key,
        secret_key,
    } = keypair;
    (
        CredentialDefinition {
            schema_id: schema_id.to_string(),
            signature_type,
            tag: tag.to_string(),
            value: CredentialDefinitionData {
                primary: public_key,
                revocation: revocation_public,
            },
            issuer_id: issuer_id.to_string(),
        },
        CredentialDefinitionPrivate {
            primary: secret_key,
            revocation: revocation_secret,
        },
        proof,
    )
}

pub fn create_credential_offer<R: RngCore>(
    rng: &mut R,
    schema_id: &str,
    cred_def_id: &str,
    correctness_proof: &CredentialKeyCorrectnessProof,
) -> Result<CredentialOffer> {
    Ok(CredentialOffer {
        schema_id: schema_id.to_string(),
        cred_def_id: cred_def_id.to_string(),
        key_correctness_proof: correctness_proof.clone(),
        nonce: Nonce::new(rng),
    })
}

/// Signs `values` for the holder of `request`. With `revocation`, the next unissued index of the
/// registry is allocated to the credential and the status list is updated to the new version.
pub fn create_credential<R: RngCore, T: TailsAccessor<Curve>>(
    rng: &mut R,
    cred_def: &CredentialDefinition,
    cred_def_private: &CredentialDefinitionPrivate,
    offer: &CredentialOffer,
    request: &CredentialRequest,
    values: CredentialValues,
    mut revocation: Option<CredentialRevocationConfig<'_, T>>,
) -> Result<Credential> {
    trace!(
        "create_credential: >>> cred_def_id: {}, values: {:?}",
        offer.cred_def_id,
        values
    );
    if request.cred_def_id != offer.cred_def_id {
        return Err(err_msg!(
            InvalidInput,
            "Request is for credential definition {}, offer for {}",
            request.cred_def_id,
            offer.cred_def_id
        ));
    }
    let pk = &cred_def.value.primary;
    request.blinded_ms_correctness_proof.verify(
        pk,
        &request.blinded_ms,
        offer.nonce.as_int(),
    )?;
    let prover_id = request.prover_id()?;

    let expected = pk.attribute_names().cloned().collect::<BTreeSet<_>>();
    let encoded = values.encoded_ints()?;
    if encoded.len() != values.0.len() || encoded.keys().cloned().collect::<BTreeSet<_>>() != expected
    {
        return Err(err_msg!(
            AttributeMismatch,
            "Credential values {:?} are not those of the schema {:?}",
            values.0.keys().collect::<Vec<_>>(),
            expected
        ));
    }

    let index = match &revocation {
        Some(config) => {
            if config.reg_def.cred_def_id != offer.cred_def_id {
                return Err(err_msg!(
                    InvalidInput,
                    "Revocation registry is for credential definition {}",
                    config.reg_def.cred_def_id
                ));
            }
            if config.status_list.max_cred_num() != config.reg_def.max_cred_num() {
                return Err(err_msg!(
                    InvalidInput,
                    "Status list is not for the revocation registry"
                ));
            }
            Some(config.status_list.next_unissued_index().ok_or_else(|| {
                err_msg!(
                    RevocationRegistryFull,
                    "No unissued index in registry {}",
                    config.status_list.rev_reg_def_id
                )
            })?)
        }
        None => None,
    };
    let m2 = credential_context(prover_id, index);

    let (p_credential, signature_correctness_proof) =
        PrimarySignature::new(
            rng,
            pk,
            &cred_def_private.primary,
            &request.blinded_ms.u,
            &encoded,
            &int_from_field_elem(&m2),
            request.nonce.as_int(),
        )?;

    let (r_credential, rev_reg_id, rev_reg, witness) = match (revocation.as_mut(), index) {
        (Some(config), Some(index)) => {
            let key = cred_def.revocation_key()?;
            let secret_key = cred_def_private.revocation.as_ref().ok_or_else(|| {
                err_msg!(
                    InvalidInput,
                    "Private credential definition has no revocation key"
                )
            })?;
            let blinded = request.blinded_revocation_secret.as_ref().ok_or_else(|| {
                err_msg!(
                    InvalidInput,
                    "Request for a revocable credential has no blinded revocation secret"
                )
            })?;
            let signature = NonRevocationSignature::new(
                rng,
                &key.params,
                secret_key,
                &config.reg_def_private.value,
                config.reg_def.max_cred_num(),
                index,
                m2,
                blinded,
            )?;
            let allocated = config.status_list.allocate(config.tails, config.timestamp)?;
            if allocated != index {
                return Err(err_msg!(
                    Unexpected,
                    "Allocated index {} instead of {}",
                    allocated,
                    index
                ));
            }
            let issued = config.status_list.issued_indices();
            let witness = Witness::new(index, &issued, config.tails)?;
            debug!(
                "create_credential: issued index {} of registry {}",
                index, config.status_list.rev_reg_def_id
            );
            (
                Some(signature),
                Some(config.status_list.rev_reg_def_id.clone()),
                Some(config.status_list.current_accumulator),
                Some(witness),
            )
        }
        _ => (None, None, None, None),
    };

    trace!("create_credential: <<<");
    Ok(Credential {
        schema_id: offer.schema_id.clone(),
        cred_def_id: offer.cred_def_id.clone(),
        rev_reg_id,
        rev_reg_index: r_credential.as_ref().map(|r| r.i),
        values,
        signature: CredentialSignature {
            p_credential,
            r_credential,
        },
        signature_correctness_proof,
        rev_reg,
        witness,
    })
}

/// Credential context `m2`, SHA-256 of the holder's entropy or DID followed by the registry
/// index in decimal, reduced modulo the order of the revocation group
pub(crate) fn credential_context(prover_id: &str, index: Option<u32>) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(prover_id.as_bytes());
    if let Some(i) = index {
        hasher.update(i.to_string().as_bytes());
    }
    Scalar::from_be_bytes_mod_order(&hasher.finalize())
}

/// Keys and tails of a new registry of `max_cred_num` credentials of `cred_def`. The issuer
/// publishes the tails at `tails_location`.
pub fn create_revocation_registry_def<R: RngCore>(
    rng: &mut R,
    cred_def: &CredentialDefinition,
    cred_def_id: &str,
    tag: &str,
    rev_reg_type: RegistryType,
    max_cred_num: u32,
    tails_location: &str,
) -> Result<(
    RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate,
    Tails<Curve>,
)> {
    trace!(
        "create_revocation_registry_def: >>> cred_def_id: {}, max_cred_num: {}",
        cred_def_id,
        max_cred_num
    );
    let key = cred_def.revocation_key()?;
    let registry_secret = RegistrySecretKey::new(rng);
    let accum_key = AccumulatorPublicKey::new(&registry_secret, &key.params, max_cred_num)?;
    let tails = Tails::generate(&key.params, &registry_secret, max_cred_num)?;
    let tails_hash = tails.hash()?;
    trace!("create_revocation_registry_def: <<< tails_hash: {}", tails_hash);
    Ok((
        RevocationRegistryDefinition {
            issuer_id: cred_def.issuer_id.clone(),
            revoc_def_type: rev_reg_type,
            tag: tag.to_string(),
            cred_def_id: cred_def_id.to_string(),
            value: RevocationRegistryDefinitionValue {
                max_cred_num,
                public_keys: RevocationRegistryDefinitionValuePublicKeys { accum_key },
                tails_hash,
                tails_location: tails_location.to_string(),
            },
        },
        RevocationRegistryDefinitionPrivate {
            value: registry_secret,
        },
        tails,
    ))
}

/// First version of a registry's status list, every index unissued
pub fn create_revocation_status_list(
    rev_reg_def_id: &str,
    rev_reg_def: &RevocationRegistryDefinition,
    timestamp: u64,
) -> Result<RevocationStatusList> {
    RevocationStatusList::new(
        rev_reg_def_id,
        rev_reg_def.issuer_id.as_str(),
        rev_reg_def.max_cred_num(),
        timestamp,
    )
}

/// New version of the status list where the `revoked` indices are revoked and the `issued` ones,
/// revoked earlier, are issued again. The list is unchanged on error.
pub fn update_revocation_status_list<T: TailsAccessor<Curve>>(
    status_list: &mut RevocationStatusList,
    rev_reg_def: &RevocationRegistryDefinition,
    tails: &T,
    issued: &BTreeSet<u32>,
    revoked: &BTreeSet<u32>,
    timestamp: u64,
) -> Result<()> {
    let max = rev_reg_def.max_cred_num();
    if status_list.max_cred_num() != max || tails.max_cred_num() != max {
        return Err(err_msg!(
            InvalidInput,
            "Status list or tails are not for a registry of {} credentials",
            max
        ));
    }
    status_list.update(issued, revoked, tails, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        data_types::{credential::MakeCredentialValues, rev_status_list::CredentialStatus},
        error::ErrorKind,
        prover::{create_credential_request, create_link_secret},
    };
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use std::str::FromStr;
    use test_utils::primes::{SAFE_PRIME_1024_P, SAFE_PRIME_1024_Q};

    fn primes() -> (BigUint, BigUint) {
        (
            BigUint::from_str(SAFE_PRIME_1024_P).unwrap(),
            BigUint::from_str(SAFE_PRIME_1024_Q).unwrap(),
        )
    }

    #[test]
    fn credential_context_depends_on_index() {
        let a = credential_context("entropy", None);
        assert_eq!(a, credential_context("entropy", None));
        assert_ne!(a, credential_context("entropy", Some(1)));
        assert_ne!(credential_context("entropy", Some(1)), credential_context("entropy", Some(2)));
        assert_ne!(a, credential_context("other", None));
    }

    #[test]
    fn issue_revocable_credentials() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let (p, q) = primes();
        let schema = create_schema(
            "gvt",
            "1.0",
            "issuer",
            vec!["name".to_string(), "age".to_string()].into(),
        )
        .unwrap();
        let (cred_def, cred_def_priv, kcp) = create_credential_definition_with_safe_primes(
            &mut rng,
            "schema:gvt",
            &schema,
            "issuer",
            "tag",
            SignatureType::CL,
            true,
            &p,
            &q,
        )
        .unwrap();
        assert!(cred_def.support_revocation());
        let (reg_def, reg_def_priv, tails) = create_revocation_registry_def(
            &mut rng,
            &cred_def,
            "creddef:gvt",
            "default",
            RegistryType::CL_ACCUM,
            2,
            "tails",
        )
        .unwrap();
        assert_eq!(reg_def.value.tails_hash, tails.hash().unwrap());
        let mut list = create_revocation_status_list("revreg:1", &reg_def, 10).unwrap();

        let link_secret = create_link_secret(&mut rng);
        let mut values = MakeCredentialValues::default();
        values.add_raw("name", "Alice").add_raw("age", "28");
        let values: CredentialValues = values.into();

        let issue = |rng: &mut StdRng, list: &mut RevocationStatusList, ts: u64| {
            let offer =
                create_credential_offer(rng, "schema:gvt", "creddef:gvt", &kcp).unwrap();
            let (request, _) = create_credential_request(
                rng,
                Some("entropy"),
                None,
                &cred_def,
                &link_secret,
                "default",
                &offer,
            )
            .unwrap();
            create_credential(
                rng,
                &cred_def,
                &cred_def_priv,
                &offer,
                &request,
                values.clone(),
                Some(CredentialRevocationConfig {
                    reg_def: &reg_def,
                    reg_def_private: &reg_def_priv,
                    status_list: list,
                    tails: &tails,
                    timestamp: ts,
                }),
            )
        };

        let first = issue(&mut rng, &mut list, 11).unwrap();
        assert_eq!(first.rev_reg_index, Some(1));
        assert_eq!(first.rev_reg_id.as_deref(), Some("revreg:1"));
        assert_eq!(first.rev_reg, Some(list.current_accumulator));
        let second = issue(&mut rng, &mut list, 12).unwrap();
        assert_eq!(second.rev_reg_index, Some(2));
        assert_eq!(list.timestamp, 12);
        assert_eq!(list.status(2).unwrap(), CredentialStatus::Issued);

        let before = list.clone();
        assert_eq!(
            issue(&mut rng, &mut list, 13).unwrap_err().kind(),
            ErrorKind::RevocationRegistryFull
        );
        assert_eq!(list, before);

        let revoked = [1].into_iter().collect();
        update_revocation_status_list(
            &mut list,
            &reg_def,
            &tails,
            &BTreeSet::new(),
            &revoked,
            20,
        )
        .unwrap();
        assert_eq!(list.status(1).unwrap(), CredentialStatus::Revoked);
        // A revoked index is not issued to another credential
        assert!(issue(&mut rng, &mut list, 21).is_err());
    }

    #[test]
    fn attribute_values_must_match_schema() {
        let mut rng = StdRng::seed_from_u64(0u64);
        let (p, q) = primes();
        let schema = create_schema(
            "gvt",
            "1.0",
            "issuer",
            vec!["name".to_string(), "age".to_string()].into(),
        )
        .unwrap();
        let (cred_def, cred_def_priv, kcp) = create_credential_definition_with_safe_primes(
            &mut rng,
            "schema:gvt",
            &schema,
            "issuer",
            "tag",
            SignatureType::CL,
            false,
            &p,
            &q,
        )
        .unwrap();
        assert!(!cred_def.support_revocation());
        assert!(cred_def_priv.revocation.is_none());
        let link_secret = create_link_secret(&mut rng);
        let offer = create_credential_offer(&mut rng, "schema:gvt", "creddef:gvt", &kcp).unwrap();
        let (request, _) = create_credential_request(
            &mut rng,
            None,
            Some("did:holder"),
            &cred_def,
            &link_secret,
            "default",
            &offer,
        )
        .unwrap();

        let mut missing = MakeCredentialValues::default();
        missing.add_raw("name", "Alice");
        let mut extra = missing.clone();
        extra.add_raw("age", "28").add_raw("height", "175");
        let mut duplicate = missing.clone();
        duplicate.add_raw("age", "28").add_raw("Age", "28");
        for values in [missing, extra, duplicate] {
            assert_eq!(
                create_credential::<_, Tails<Curve>>(
                    &mut rng,
                    &cred_def,
                    &cred_def_priv,
                    &offer,
                    &request,
                    values.into(),
                    None,
                )
                .unwrap_err()
                .kind(),
                ErrorKind::AttributeMismatch
            );
        }

        // Request bound to another offer's nonce
        let other = create_credential_offer(&mut rng, "schema:gvt", "creddef:gvt", &kcp).unwrap();
        let mut values = MakeCredentialValues::default();
        values.add_raw("Name", "Alice").add_raw("age", "28");
        assert_eq!(
            create_credential::<_, Tails<Curve>>(
                &mut rng,
                &cred_def,
                &cred_def_priv,
                &other,
                &request,
                values.clone().into(),
                None,
            )
            .unwrap_err()
            .kind(),
            ErrorKind::CryptoVerificationFailed
        );
        let cred = create_credential::<_, Tails<Curve>>(
            &mut rng,
            &cred_def,
            &cred_def_priv,
            &offer,
            &request,
            values.into(),
            None,
        )
        .unwrap();
        assert!(cred.signature.r_credential.is_none());
        assert!(cred.rev_reg_id.is_none());
        assert!(cred.rev_reg_index.is_none());
    }
}
