//! Operations of the holder, called prover when presenting

use crate::{
    data_types::{
        attr_common_view,
        cred_def::CredentialDefinition,
        cred_offer::CredentialOffer,
        cred_request::{CredentialRequest, CredentialRequestMetadata},
        credential::{AttributeValues, Credential},
        link_secret::LinkSecret,
        nonce::Nonce,
        pres_request::PresentationRequest,
        presentation::{
            AggregatedProof, Identifier, Presentation, Proof, RequestedProof,
            RevealedAttributeGroupInfo, RevealedAttributeInfo, SubProof, SubProofReferent,
        },
        rev_reg_def::RevocationRegistryDefinition,
        rev_state::CredentialRevocationState,
        rev_status_list::{CredentialStatus, RevocationStatusList},
        schema::Schema,
        Curve, Scalar,
    },
    error::Result,
};
use anoncreds_utils::bn::field_elem_from_int;
use ark_std::rand::RngCore;
use cks_accumulator::{
    accumulator::index_delta,
    proof::NonRevocProofProtocol,
    signature::BlindedRevocationSecret,
    tails::{verify_tails_hash, TailsAccessor},
    witness::Witness,
};
use cl_signatures::{
    blind::BlindedLinkSecret,
    constants::LINK_SECRET_NAME,
    proof::{predicate::Predicate, PrimaryProofProtocol},
};
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

pub fn create_link_secret<R: RngCore>(rng: &mut R) -> LinkSecret {
    LinkSecret::new(rng)
}

/// Request for the credential offered in `offer`, committing to `link_secret`. The holder gives
/// at most one of `entropy` and `prover_did`, random entropy is used when it gives neither.
pub fn create_credential_request<R: RngCore>(
    rng: &mut R,
    entropy: Option<&str>,
    prover_did: Option<&str>,
    cred_def: &CredentialDefinition,
    link_secret: &LinkSecret,
    link_secret_id: &str,
    offer: &CredentialOffer,
) -> Result<(CredentialRequest, CredentialRequestMetadata)> {
    trace!(
        "create_credential_request: >>> cred_def_id: {}, prover_did: {:?}",
        offer.cred_def_id,
        prover_did
    );
    let (entropy, prover_did) = match (entropy, prover_did) {
        (Some(_), Some(_)) => {
            return Err(err_msg!(
                InvalidInput,
                "Only one of entropy and prover_did can be given"
            ))
        }
        (None, None) => (Some(Nonce::new(rng).to_string()), None),
        (e, d) => (e.map(String::from), d.map(String::from)),
    };
    let pk = &cred_def.value.primary;
    offer.key_correctness_proof.verify(pk)?;

    let (blinded_ms, link_secret_blinding_data, blinded_ms_correctness_proof) =
        BlindedLinkSecret::new(rng, pk, link_secret.as_int(), offer.nonce.as_int())?;
    let (blinded_revocation_secret, revocation_blinding_data) = match &cred_def.value.revocation
    {
        Some(key) => {
            let (blinded, factor) = BlindedRevocationSecret::new(rng, &key.params);
            (Some(blinded), Some(factor))
        }
        None => (None, None),
    };
    let nonce = Nonce::new(rng);

    trace!("create_credential_request: <<<");
    Ok((
        CredentialRequest {
            entropy,
            prover_did,
            cred_def_id: offer.cred_def_id.clone(),
            blinded_ms,
            blinded_ms_correctness_proof,
            blinded_revocation_secret,
            nonce: nonce.clone(),
        },
        CredentialRequestMetadata {
            link_secret_blinding_data,
            revocation_blinding_data,
            nonce,
            link_secret_name: link_secret_id.to_string(),
        },
    ))
}

/// Checks the issuer's signature correctness proof and unblinds the signatures of a received
/// credential. The credential is unchanged on error.
pub fn process_credential(
    credential: &mut Credential,
    metadata: &CredentialRequestMetadata,
    link_secret: &LinkSecret,
    cred_def: &CredentialDefinition,
    rev_reg_def: Option<&RevocationRegistryDefinition>,
) -> Result<()> {
    trace!(
        "process_credential: >>> cred_def_id: {}, rev_reg_id: {:?}",
        credential.cred_def_id,
        credential.rev_reg_id
    );
    let signed_index = credential.signature.r_credential.as_ref().map(|r| r.i);
    if credential.rev_reg_index != signed_index {
        return Err(err_msg!(
            InvalidInput,
            "Credential has registry index {:?} but its non-revocation signature is on {:?}",
            credential.rev_reg_index,
            signed_index
        ));
    }
    let pk = &cred_def.value.primary;
    let values = credential.values.encoded_ints()?;
    let blinded = metadata
        .link_secret_blinding_data
        .blind(pk, link_secret.as_int())?;
    credential.signature_correctness_proof.verify(
        &credential.signature.p_credential,
        pk,
        &blinded.u,
        &values,
        metadata.nonce.as_int(),
    )?;

    let mut signature = credential.signature.clone();
    signature
        .p_credential
        .unblind(&metadata.link_secret_blinding_data.v_prime);
    signature
        .p_credential
        .verify(pk, &values, link_secret.as_int())?;

    if let Some(r_credential) = signature.r_credential.as_mut() {
        let factor = metadata.revocation_blinding_data.as_ref().ok_or_else(|| {
            err_msg!(
                InvalidInput,
                "Revocable credential but the request had no revocation blinding factor"
            )
        })?;
        let rev_reg_def = rev_reg_def.ok_or_else(|| {
            err_msg!(
                InvalidInput,
                "Revocable credential needs its revocation registry definition"
            )
        })?;
        if rev_reg_def.cred_def_id != credential.cred_def_id {
            return Err(err_msg!(
                InvalidInput,
                "Revocation registry is for credential definition {}",
                rev_reg_def.cred_def_id
            ));
        }
        let (accumulator, witness) = match (&credential.rev_reg, &credential.witness) {
            (Some(a), Some(w)) => (a, w),
            _ => {
                return Err(err_msg!(
                    InvalidInput,
                    "Revocable credential without accumulator or witness"
                ))
            }
        };
        let key = cred_def.revocation_key()?;
        r_credential.unblind(factor);
        r_credential.verify(
            &key.params,
            &key.public_key,
            rev_reg_def.accum_key(),
            accumulator,
            witness,
        )?;
    }
    credential.signature = signature;
    trace!("process_credential: <<<");
    Ok(())
}

/// Checks the primary signature of a processed credential against its values
pub fn verify_credential_signature(
    credential: &Credential,
    cred_def: &CredentialDefinition,
    link_secret: &LinkSecret,
) -> Result<()> {
    let values = credential.values.encoded_ints()?;
    credential.signature.p_credential.verify(
        &cred_def.value.primary,
        &values,
        link_secret.as_int(),
    )?;
    Ok(())
}

/// Witness of index `rev_reg_idx` for the accumulator of `status_list`. With a previous state
/// and the status list version it was computed for, the witness is updated by the indices that
/// changed in between, otherwise it is computed from all issued indices after checking the
/// tails against the registry's hash.
pub fn create_or_update_revocation_state<T: TailsAccessor<Curve>>(
    tails: &T,
    rev_reg_def: &RevocationRegistryDefinition,
    status_list: &RevocationStatusList,
    rev_reg_idx: u32,
    previous: Option<(&CredentialRevocationState, &RevocationStatusList)>,
) -> Result<CredentialRevocationState> {
    trace!(
        "create_or_update_revocation_state: >>> index: {}, timestamp: {}",
        rev_reg_idx,
        status_list.timestamp
    );
    let max = rev_reg_def.max_cred_num();
    if status_list.max_cred_num() != max || tails.max_cred_num() != max {
        return Err(err_msg!(
            InvalidInput,
            "Status list or tails are not for a registry of {} credentials",
            max
        ));
    }
    if status_list.status(rev_reg_idx)? != CredentialStatus::Issued {
        return Err(err_msg!(
            RevocationStateInvalid,
            "Index {} is not issued in status list version {}",
            rev_reg_idx,
            status_list.timestamp
        ));
    }
    let issued = status_list.issued_indices();
    let witness = match previous {
        Some((state, prev_list)) => {
            if prev_list.timestamp != state.timestamp
                || prev_list.current_accumulator != state.rev_reg
                || prev_list.max_cred_num() != max
            {
                return Err(err_msg!(
                    RevocationStateInvalid,
                    "Previous state is not for the previous status list"
                ));
            }
            if status_list.timestamp < prev_list.timestamp {
                return Err(err_msg!(
                    RevocationStateInvalid,
                    "Status list version {} is older than the previous state's {}",
                    status_list.timestamp,
                    prev_list.timestamp
                ));
            }
            let (added, removed) = index_delta(&prev_list.issued_indices(), &issued);
            debug!(
                "create_or_update_revocation_state: {} issued and {} revoked since {}",
                added.len(),
                removed.len(),
                prev_list.timestamp
            );
            state
                .witness
                .update(rev_reg_idx, &added, &removed, tails)?
        }
        None => {
            verify_tails_hash::<Curve, T>(tails, &rev_reg_def.value.tails_hash)?;
            Witness::new(rev_reg_idx, &issued, tails)?
        }
    };
    trace!("create_or_update_revocation_state: <<<");
    Ok(CredentialRevocationState {
        witness,
        rev_reg: status_list.current_accumulator,
        timestamp: status_list.timestamp,
    })
}

/// Credentials selected to answer a presentation request, each with the referents it answers
#[derive(Debug, Default)]
pub struct PresentCredentials<'p>(Vec<PresentCredential<'p>>);

#[derive(Debug)]
struct PresentCredential<'p> {
    cred: &'p Credential,
    rev_state: Option<&'p CredentialRevocationState>,
    /// Referent to whether its values are revealed
    requested_attributes: BTreeMap<String, bool>,
    requested_predicates: BTreeSet<String>,
}

/// Adds referents to a credential of [`PresentCredentials`]
pub struct AddCredential<'a, 'p>(&'a mut PresentCredential<'p>);

impl<'p> PresentCredentials<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cred` in the presentation. A revocation state proves the credential is not revoked in
    /// the status list version of the state's timestamp.
    pub fn add_credential(
        &mut self,
        cred: &'p Credential,
        rev_state: Option<&'p CredentialRevocationState>,
    ) -> AddCredential<'_, 'p> {
        self.0.push(PresentCredential {
            cred,
            rev_state,
            requested_attributes: BTreeMap::new(),
            requested_predicates: BTreeSet::new(),
        });
        let last = self.0.len() - 1;
        AddCredential(&mut self.0[last])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AddCredential<'_, '_> {
    pub fn add_requested_attribute(
        &mut self,
        referent: impl Into<String>,
        revealed: bool,
    ) -> &mut Self {
        self.0.requested_attributes.insert(referent.into(), revealed);
        self
    }

    pub fn add_requested_predicate(&mut self, referent: impl Into<String>) -> &mut Self {
        self.0.requested_predicates.insert(referent.into());
        self
    }
}

/// Prepared sub-proof whose responses are computed once the challenge is known
struct SubProofBuilder {
    primary: PrimaryProofProtocol,
    non_revoc: Option<NonRevocProofProtocol<Curve>>,
}

/// One presentation answering `pres_req` with `credentials` and `self_attested` values. All
/// sub-proofs share one challenge so that they are about the same link secret.
pub fn create_presentation<R: RngCore>(
    rng: &mut R,
    pres_req: &PresentationRequest,
    credentials: PresentCredentials,
    self_attested: Option<BTreeMap<String, String>>,
    link_secret: &LinkSecret,
    schemas: &BTreeMap<String, &Schema>,
    cred_defs: &BTreeMap<String, &CredentialDefinition>,
) -> Result<Presentation> {
    trace!(
        "create_presentation: >>> request: {}, credentials: {}",
        pres_req.name,
        credentials.len()
    );
    pres_req.validate()?;
    let self_attested = self_attested.unwrap_or_default();
    check_referents(pres_req, &credentials, &self_attested)?;

    let mut requested_proof = RequestedProof {
        self_attested_attrs: self_attested,
        ..Default::default()
    };
    let mut identifiers = Vec::with_capacity(credentials.len());
    let mut builders = Vec::with_capacity(credentials.len());
    let mut tau_list = Vec::new();
    let mut c_list = Vec::new();

    for (index, present) in credentials.0.iter().enumerate() {
        let sub_proof_index = index as u32;
        let cred = present.cred;
        if !schemas.contains_key(&cred.schema_id) {
            return Err(err_msg!(InvalidInput, "Schema {} not given", cred.schema_id));
        }
        let cred_def = cred_defs.get(&cred.cred_def_id).ok_or_else(|| {
            err_msg!(
                InvalidInput,
                "Credential definition {} not given",
                cred.cred_def_id
            )
        })?;

        let mut revealed = BTreeSet::new();
        let mut needs_non_revocation = false;
        for (referent, reveal) in &present.requested_attributes {
            let info = &pres_req.requested_attributes[referent];
            needs_non_revocation |= pres_req.interval_for(&info.non_revoked).is_some();
            let mut group = BTreeMap::new();
            for name in info.names()? {
                let value = cred.values.get(name).ok_or_else(|| {
                    err_msg!(
                        AttributeMismatch,
                        "Credential has no attribute {} for {}",
                        name,
                        referent
                    )
                })?;
                if *reveal {
                    revealed.insert(attr_common_view(name));
                }
                group.insert(name.clone(), value.clone());
            }
            match (info.is_group(), *reveal) {
                (true, true) => {
                    requested_proof.revealed_attr_groups.insert(
                        referent.clone(),
                        RevealedAttributeGroupInfo {
                            sub_proof_index,
                            values: group,
                        },
                    );
                }
                (true, false) => {
                    return Err(err_msg!(
                        InvalidInput,
                        "Attribute group {} can only be revealed",
                        referent
                    ))
                }
                (false, true) => {
                    let AttributeValues { raw, encoded } = group
                        .into_values()
                        .next()
                        .ok_or_else(|| err_msg!(Unexpected, "No value for {}", referent))?;
                    requested_proof.revealed_attrs.insert(
                        referent.clone(),
                        RevealedAttributeInfo {
                            sub_proof_index,
                            raw,
                            encoded,
                        },
                    );
                }
                (false, false) => {
                    requested_proof
                        .unrevealed_attrs
                        .insert(referent.clone(), SubProofReferent { sub_proof_index });
                }
            }
        }

        let mut predicates = Vec::with_capacity(present.requested_predicates.len());
        for referent in &present.requested_predicates {
            let info = &pres_req.requested_predicates[referent];
            needs_non_revocation |= pres_req.interval_for(&info.non_revoked).is_some();
            if cred.values.get(&info.name).is_none() {
                return Err(err_msg!(
                    AttributeMismatch,
                    "Credential has no attribute {} for {}",
                    info.name,
                    referent
                ));
            }
            predicates.push(Predicate::new(
                attr_common_view(&info.name),
                info.p_type,
                info.p_value,
            ));
            requested_proof
                .predicates
                .insert(referent.clone(), SubProofReferent { sub_proof_index });
        }

        let mut values = cred.values.encoded_ints()?;
        values.insert(LINK_SECRET_NAME.to_string(), link_secret.as_int().clone());
        let primary = PrimaryProofProtocol::init(
            rng,
            &cred_def.value.primary,
            &cred.signature.p_credential,
            &values,
            &revealed,
            &predicates,
        )?;

        let (non_revoc, timestamp) = match (&cred.signature.r_credential, present.rev_state) {
            (Some(r_credential), Some(state)) => {
                let key = cred_def.revocation_key()?;
                let m2_tilde = field_elem_from_int::<Scalar>(primary.m2_tilde());
                let protocol = NonRevocProofProtocol::init(
                    rng,
                    &key.params,
                    &key.public_key,
                    &state.rev_reg,
                    r_credential,
                    &state.witness,
                    m2_tilde,
                )?;
                tau_list.append(&mut protocol.tau_list()?);
                c_list.append(&mut protocol.c_list()?);
                (Some(protocol), Some(state.timestamp))
            }
            (None, Some(_)) => {
                return Err(err_msg!(
                    InvalidInput,
                    "Revocation state given for a credential that can't be revoked"
                ))
            }
            (Some(_), None) if needs_non_revocation => {
                return Err(err_msg!(
                    InvalidInput,
                    "Request asks for non-revocation but no revocation state is given for a credential of {}",
                    cred.cred_def_id
                ))
            }
            _ => (None, None),
        };
        tau_list.append(&mut primary.tau_list());
        c_list.append(&mut primary.c_list());

        identifiers.push(Identifier {
            schema_id: cred.schema_id.clone(),
            cred_def_id: cred.cred_def_id.clone(),
            rev_reg_id: cred.rev_reg_id.clone(),
            timestamp,
        });
        builders.push(SubProofBuilder { primary, non_revoc });
    }

    let c_hash = AggregatedProof::challenge(&tau_list, &c_list, &pres_req.nonce);
    let c_field = field_elem_from_int::<Scalar>(&c_hash);
    let proofs = builders
        .into_iter()
        .map(|b| -> Result<SubProof> {
            Ok(SubProof {
                primary_proof: b.primary.gen_proof(&c_hash)?,
                non_revoc_proof: b.non_revoc.map(|n| n.gen_proof(&c_field)),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    trace!("create_presentation: <<< c_hash: {}", c_hash);
    Ok(Presentation {
        proof: Proof {
            proofs,
            aggregated_proof: AggregatedProof { c_hash, c_list },
        },
        requested_proof,
        identifiers,
    })
}

/// Each requested referent must be answered exactly once. Attributes by a credential or a
/// self-attested value, predicates by a credential.
fn check_referents(
    pres_req: &PresentationRequest,
    credentials: &PresentCredentials,
    self_attested: &BTreeMap<String, String>,
) -> Result<()> {
    let mut attributes = BTreeSet::new();
    let mut predicates = BTreeSet::new();
    for present in &credentials.0 {
        for referent in present.requested_attributes.keys() {
            if !pres_req.requested_attributes.contains_key(referent) {
                return Err(err_msg!(InvalidInput, "Attribute {} is not requested", referent));
            }
            if !attributes.insert(referent) {
                return Err(err_msg!(InvalidInput, "Attribute {} answered twice", referent));
            }
        }
        for referent in &present.requested_predicates {
            if !pres_req.requested_predicates.contains_key(referent) {
                return Err(err_msg!(InvalidInput, "Predicate {} is not requested", referent));
            }
            if !predicates.insert(referent) {
                return Err(err_msg!(InvalidInput, "Predicate {} answered twice", referent));
            }
        }
    }
    for referent in self_attested.keys() {
        let info = pres_req.requested_attributes.get(referent).ok_or_else(|| {
            err_msg!(InvalidInput, "Self attested {} is not requested", referent)
        })?;
        if info.is_group() {
            return Err(err_msg!(
                InvalidInput,
                "Attribute group {} can't be self attested",
                referent
            ));
        }
        if !attributes.insert(referent) {
            return Err(err_msg!(InvalidInput, "Attribute {} answered twice", referent));
        }
    }
    if let Some(r) = pres_req
        .requested_attributes
        .keys()
        .find(|r| !attributes.contains(r))
    {
        return Err(err_msg!(InvalidInput, "Attribute {} is not answered", r));
    }
    if let Some(r) = pres_req
        .requested_predicates
        .keys()
        .find(|r| !predicates.contains(r))
    {
        return Err(err_msg!(InvalidInput, "Predicate {} is not answered", r));
    }
    Ok(())
}

