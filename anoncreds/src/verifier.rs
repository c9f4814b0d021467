//! Verification of presentations.
//!
//! The structure of a presentation is checked against its request first: every referent is
//! answered once, restrictions hold for the credential used, revealed raw values encode to the
//! revealed integers and non-revocation is proven where the request asks for it. Problems there
//! are errors. Then the tau list of every sub-proof is recomputed, in parallel with the
//! `parallel` feature, and the challenge is recomputed from it. A presentation whose
//! cryptographic checks fail verifies to `false`.

use crate::{
    config::VerifierConfig,
    data_types::{
        attr_common_view,
        cred_def::CredentialDefinition,
        pres_request::{restrictions_hold, NonRevokedInterval, PresentationRequest, RestrictionSubject},
        presentation::{AggregatedProof, Identifier, Presentation, SubProof},
        rev_reg_def::RevocationRegistryDefinition,
        rev_status_list::RevocationStatusList,
        schema::Schema,
        Scalar,
    },
    encoding::{encoded_to_int, is_encoding_of},
    error::Result,
};
use anoncreds_utils::bn::field_elem_from_int;
use ark_std::cfg_iter;
use cl_signatures::{error::CLError, proof::predicate::Predicate};
use log::{debug, trace};
use num_bigint::BigUint;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Public material a sub-proof is checked with, gathered before any cryptographic check
struct SubProofCheck<'a> {
    sub_proof: &'a SubProof,
    cred_def: &'a CredentialDefinition,
    expected_revealed: BTreeMap<String, BigUint>,
    predicates: Vec<Predicate>,
    /// Unrevealed attributes the proof must hide
    hidden: BTreeSet<String>,
    revocation: Option<(&'a RevocationRegistryDefinition, &'a RevocationStatusList)>,
}

/// Referents answered by one sub-proof
#[derive(Default)]
struct Answered<'a> {
    /// Referent and its requested names
    attributes: Vec<(&'a str, Vec<&'a String>)>,
    predicates: Vec<&'a str>,
    intervals: Vec<NonRevokedInterval>,
}

pub fn verify_presentation(
    presentation: &Presentation,
    pres_req: &PresentationRequest,
    schemas: &BTreeMap<String, &Schema>,
    cred_defs: &BTreeMap<String, &CredentialDefinition>,
    rev_reg_defs: Option<&BTreeMap<String, &RevocationRegistryDefinition>>,
    rev_status_lists: Option<&[&RevocationStatusList]>,
    config: &VerifierConfig,
) -> Result<bool> {
    trace!(
        "verify_presentation: >>> request: {}, sub-proofs: {}",
        pres_req.name,
        presentation.proof.proofs.len()
    );
    pres_req.validate()?;
    let sub_proofs = &presentation.proof.proofs;
    if sub_proofs.len() != presentation.identifiers.len() {
        return Err(err_msg!(
            InvalidInput,
            "{} sub-proofs but {} identifiers",
            sub_proofs.len(),
            presentation.identifiers.len()
        ));
    }

    let mut answered = check_requested_proof(presentation, pres_req, config)?;
    let mut checks = Vec::with_capacity(sub_proofs.len());
    for (i, (sub_proof, identifier)) in sub_proofs
        .iter()
        .zip(&presentation.identifiers)
        .enumerate()
    {
        let answered = std::mem::take(&mut answered[i]);
        checks.push(prepare_sub_proof(
            i as u32,
            sub_proof,
            identifier,
            &answered,
            presentation,
            pres_req,
            schemas,
            cred_defs,
            rev_reg_defs,
            rev_status_lists,
            config,
        )?);
    }

    let c_hash = &presentation.proof.aggregated_proof.c_hash;
    let c_field = field_elem_from_int::<Scalar>(c_hash);
    let lists = cfg_iter!(checks)
        .map(|check| sub_proof_lists(check, c_hash, &c_field))
        .collect::<Result<Vec<_>>>()?;

    let mut tau_list = Vec::new();
    let mut c_list = Vec::new();
    for l in lists {
        match l {
            Some((mut taus, mut cs)) => {
                tau_list.append(&mut taus);
                c_list.append(&mut cs);
            }
            None => return Ok(false),
        }
    }
    if c_list != presentation.proof.aggregated_proof.c_list {
        debug!("verify_presentation: c list differs from the aggregated one");
        return Ok(false);
    }
    let valid = AggregatedProof::challenge(&tau_list, &c_list, &pres_req.nonce) == *c_hash;
    trace!("verify_presentation: <<< valid: {}", valid);
    Ok(valid)
}

/// Checks every requested referent is answered once, and only requested ones are. Returns the
/// referents answered by each sub-proof.
fn check_requested_proof<'a>(
    presentation: &'a Presentation,
    pres_req: &'a PresentationRequest,
    config: &VerifierConfig,
) -> Result<Vec<Answered<'a>>> {
    let rp = &presentation.requested_proof;
    let count = presentation.proof.proofs.len();
    let mut answered = (0..count).map(|_| Answered::default()).collect::<Vec<_>>();
    let slot = |index: u32, referent: &str| -> Result<usize> {
        if index as usize >= count {
            return Err(err_msg!(
                InvalidInput,
                "{} refers to sub-proof {} of {}",
                referent,
                index,
                count
            ));
        }
        Ok(index as usize)
    };

    for referent in rp
        .revealed_attrs
        .keys()
        .chain(rp.revealed_attr_groups.keys())
        .chain(rp.unrevealed_attrs.keys())
        .chain(rp.self_attested_attrs.keys())
    {
        if !pres_req.requested_attributes.contains_key(referent) {
            return Err(err_msg!(InvalidInput, "Attribute {} is not requested", referent));
        }
    }
    if let Some(referent) = rp
        .predicates
        .keys()
        .find(|r| !pres_req.requested_predicates.contains_key(*r))
    {
        return Err(err_msg!(InvalidInput, "Predicate {} is not requested", referent));
    }

    for (referent, info) in &pres_req.requested_attributes {
        let names = info.names()?;
        let interval = pres_req.interval_for(&info.non_revoked);
        let answers = [
            rp.revealed_attrs.get(referent).map(|a| a.sub_proof_index),
            rp.revealed_attr_groups
                .get(referent)
                .map(|a| a.sub_proof_index),
            rp.unrevealed_attrs.get(referent).map(|a| a.sub_proof_index),
        ];
        let self_attested = rp.self_attested_attrs.contains_key(referent);
        let mut indices = answers.iter().flatten();
        match (indices.next(), indices.next(), self_attested) {
            (Some(index), None, false) => {
                let grouped = rp.revealed_attr_groups.contains_key(referent);
                if grouped != info.is_group() {
                    return Err(err_msg!(
                        InvalidInput,
                        "Attribute {} answered as {}",
                        referent,
                        if grouped { "a group" } else { "a single attribute" }
                    ));
                }
                let a = &mut answered[slot(*index, referent.as_str())?];
                a.attributes.push((referent.as_str(), names));
                a.intervals.extend(interval);
            }
            (None, None, true) => {
                if !config.accept_self_attested {
                    return Err(err_msg!(
                        InvalidInput,
                        "Self attested values are not accepted, {}",
                        referent
                    ));
                }
                if info.restrictions.is_some() || info.is_group() {
                    return Err(err_msg!(
                        InvalidInput,
                        "Attribute {} has restrictions and can't be self attested",
                        referent
                    ));
                }
            }
            (None, None, false) => {
                return Err(err_msg!(InvalidInput, "Attribute {} is not answered", referent))
            }
            _ => {
                return Err(err_msg!(
                    InvalidInput,
                    "Attribute {} answered more than once",
                    referent
                ))
            }
        }
    }

    for (referent, info) in &pres_req.requested_predicates {
        let index = rp
            .predicates
            .get(referent)
            .ok_or_else(|| err_msg!(InvalidInput, "Predicate {} is not answered", referent))?
            .sub_proof_index;
        let a = &mut answered[slot(index, referent.as_str())?];
        a.predicates.push(referent.as_str());
        a.intervals.extend(pres_req.interval_for(&info.non_revoked));
    }
    Ok(answered)
}

#[allow(clippy::too_many_arguments)]
fn prepare_sub_proof<'a>(
    index: u32,
    sub_proof: &'a SubProof,
    identifier: &'a Identifier,
    answered: &Answered,
    presentation: &'a Presentation,
    pres_req: &'a PresentationRequest,
    schemas: &BTreeMap<String, &'a Schema>,
    cred_defs: &BTreeMap<String, &'a CredentialDefinition>,
    rev_reg_defs: Option<&BTreeMap<String, &'a RevocationRegistryDefinition>>,
    rev_status_lists: Option<&[&'a RevocationStatusList]>,
    config: &VerifierConfig,
) -> Result<SubProofCheck<'a>> {
    let schema = *schemas
        .get(&identifier.schema_id)
        .ok_or_else(|| err_msg!(InvalidInput, "Schema {} not given", identifier.schema_id))?;
    let cred_def = *cred_defs.get(&identifier.cred_def_id).ok_or_else(|| {
        err_msg!(
            InvalidInput,
            "Credential definition {} not given",
            identifier.cred_def_id
        )
    })?;
    if cred_def.schema_id != identifier.schema_id {
        return Err(err_msg!(
            InvalidInput,
            "Credential definition {} is not for schema {}",
            identifier.cred_def_id,
            identifier.schema_id
        ));
    }
    let subject = RestrictionSubject {
        schema_id: &identifier.schema_id,
        schema_issuer_id: &schema.issuer_id,
        schema_name: &schema.name,
        schema_version: &schema.version,
        issuer_id: &cred_def.issuer_id,
        cred_def_id: &identifier.cred_def_id,
        rev_reg_id: identifier.rev_reg_id.as_deref(),
    };

    let rp = &presentation.requested_proof;
    let mut expected_revealed = BTreeMap::new();
    let mut hidden = BTreeSet::new();
    let mut reveal = |name: &str, raw: &str, encoded: &str| -> Result<()> {
        if !is_encoding_of(raw, encoded) {
            return Err(err_msg!(
                AttributeMismatch,
                "Encoded value of {} doesn't match its raw value",
                name
            ));
        }
        let value = encoded_to_int(encoded)?;
        match expected_revealed.insert(attr_common_view(name), value.clone()) {
            Some(other) if other != value => Err(err_msg!(
                AttributeMismatch,
                "Attribute {} revealed with different values",
                name
            )),
            _ => Ok(()),
        }
    };
    for (referent, names) in &answered.attributes {
        let info = &pres_req.requested_attributes[*referent];
        if !restrictions_hold(&info.restrictions, &subject) {
            return Err(err_msg!(
                InvalidInput,
                "Credential of sub-proof {} doesn't satisfy the restrictions of {}",
                index,
                referent
            ));
        }
        if let Some(a) = rp.revealed_attrs.get(*referent) {
            reveal(names[0].as_str(), &a.raw, &a.encoded)?;
        } else if let Some(g) = rp.revealed_attr_groups.get(*referent) {
            if g.values.len() != names.len() {
                return Err(err_msg!(
                    AttributeMismatch,
                    "Attribute group {} doesn't have the requested names",
                    referent
                ));
            }
            for name in names {
                let v = g.values.get(*name).ok_or_else(|| {
                    err_msg!(AttributeMismatch, "Attribute group {} has no {}", referent, name)
                })?;
                reveal(name.as_str(), &v.raw, &v.encoded)?;
            }
        } else {
            hidden.insert(attr_common_view(names[0]));
        }
    }

    let mut predicates = Vec::with_capacity(answered.predicates.len());
    for referent in &answered.predicates {
        let info = &pres_req.requested_predicates[*referent];
        if !restrictions_hold(&info.restrictions, &subject) {
            return Err(err_msg!(
                InvalidInput,
                "Credential of sub-proof {} doesn't satisfy the restrictions of {}",
                index,
                referent
            ));
        }
        predicates.push(Predicate::new(
            attr_common_view(&info.name),
            info.p_type,
            info.p_value,
        ));
    }

    let revocation = check_non_revocation(
        index,
        sub_proof,
        identifier,
        cred_def,
        &answered.intervals,
        rev_reg_defs,
        rev_status_lists,
        config,
    )?;
    Ok(SubProofCheck {
        sub_proof,
        cred_def,
        expected_revealed,
        predicates,
        hidden,
        revocation,
    })
}

/// Checks the sub-proof proves non-revocation where the request asks for it, at a timestamp
/// in every applicable interval, and finds the registry and status list version it is against.
/// Whether non-revocation is needed follows the credential definition, not the identifier.
fn check_non_revocation<'a>(
    index: u32,
    sub_proof: &SubProof,
    identifier: &Identifier,
    cred_def: &CredentialDefinition,
    intervals: &[NonRevokedInterval],
    rev_reg_defs: Option<&BTreeMap<String, &'a RevocationRegistryDefinition>>,
    rev_status_lists: Option<&[&'a RevocationStatusList]>,
    config: &VerifierConfig,
) -> Result<Option<(&'a RevocationRegistryDefinition, &'a RevocationStatusList)>> {
    let revocable = cred_def.support_revocation();
    if revocable && !intervals.is_empty() && sub_proof.non_revoc_proof.is_none() {
        return Err(err_msg!(
            RevocationStateInvalid,
            "Sub-proof {} doesn't prove non-revocation",
            index
        ));
    }
    if identifier.rev_reg_id.is_some() != revocable {
        return Err(err_msg!(
            InvalidInput,
            "Registry {:?} of sub-proof {} doesn't fit credential definition {}",
            identifier.rev_reg_id,
            index,
            identifier.cred_def_id
        ));
    }
    let timestamp = match (&sub_proof.non_revoc_proof, identifier.timestamp) {
        (Some(_), Some(t)) => t,
        (None, None) => return Ok(None),
        _ => {
            return Err(err_msg!(
                InvalidInput,
                "Sub-proof {} must have both a non-revocation proof and a timestamp or neither",
                index
            ))
        }
    };
    if let Some(i) = intervals.iter().find(|i| !i.contains(timestamp)) {
        return Err(err_msg!(
            RevocationStateInvalid,
            "Timestamp {} of sub-proof {} is outside {:?}",
            timestamp,
            index,
            i
        ));
    }
    if timestamp > config.max_timestamp() {
        return Err(err_msg!(
            RevocationStateInvalid,
            "Timestamp {} of sub-proof {} is in the future",
            timestamp,
            index
        ));
    }
    let rev_reg_id = identifier.rev_reg_id.as_ref().ok_or_else(|| {
        err_msg!(
            InvalidInput,
            "Sub-proof {} proves non-revocation without a registry",
            index
        )
    })?;
    let rev_reg_def = *rev_reg_defs
        .and_then(|d| d.get(rev_reg_id))
        .ok_or_else(|| err_msg!(InvalidInput, "Revocation registry {} not given", rev_reg_id))?;
    if rev_reg_def.cred_def_id != identifier.cred_def_id {
        return Err(err_msg!(
            InvalidInput,
            "Revocation registry {} is not for credential definition {}",
            rev_reg_id,
            identifier.cred_def_id
        ));
    }
    let status_list = rev_status_lists
        .and_then(|lists| {
            lists
                .iter()
                .find(|l| &l.rev_reg_def_id == rev_reg_id && l.timestamp == timestamp)
        })
        .copied()
        .ok_or_else(|| {
            err_msg!(
                RevocationStateInvalid,
                "No status list of {} at timestamp {}",
                rev_reg_id,
                timestamp
            )
        })?;
    Ok(Some((rev_reg_def, status_list)))
}

/// Tau and c lists of a sub-proof for the presentation's challenge, `None` when a cryptographic
/// check fails
fn sub_proof_lists(
    check: &SubProofCheck,
    c_hash: &BigUint,
    c_field: &Scalar,
) -> Result<Option<(Vec<Vec<u8>>, Vec<Vec<u8>>)>> {
    let primary = &check.sub_proof.primary_proof;
    if let Some(name) = check
        .hidden
        .iter()
        .find(|n| !primary.eq_proof.m.contains_key(*n))
    {
        debug!("sub_proof_lists: attribute {} is not hidden in the proof", name);
        return Ok(None);
    }

    let mut tau_list = Vec::new();
    let mut c_list = Vec::new();
    if let (Some(proof), Some((rev_reg_def, status_list))) =
        (&check.sub_proof.non_revoc_proof, check.revocation)
    {
        if field_elem_from_int::<Scalar>(primary.m2_cap()) != *proof.m2_cap() {
            debug!("sub_proof_lists: primary and non-revocation proofs are about different m2");
            return Ok(None);
        }
        let key = check.cred_def.revocation_key()?;
        tau_list.append(&mut proof.verify_and_get_tau_list(
            &key.params,
            &key.public_key,
            rev_reg_def.accum_key(),
            &status_list.current_accumulator,
            c_field,
        )?);
        c_list.append(&mut proof.c_list()?);
    }

    match primary.verify_and_get_tau_list(
        &check.cred_def.value.primary,
        c_hash,
        &check.expected_revealed,
        &check.predicates,
    ) {
        Ok(mut taus) => tau_list.append(&mut taus),
        Err(
            e @ (CLError::RevealedAttributesMismatch
            | CLError::PredicateResponseMismatch(_)
            | CLError::PredicateOnRevealedAttribute(_)
            | CLError::MalformedProof
            | CLError::UtilsError(_)),
        ) => {
            debug!("sub_proof_lists: primary proof doesn't verify: {:?}", e);
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    }
    c_list.append(&mut primary.c_list());
    Ok(Some((tau_list, c_list)))
}
