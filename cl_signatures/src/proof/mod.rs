//! Proof of knowledge of a CL signature with selective disclosure and predicates.
//!
//! Like the other proofs of knowledge in this workspace, the protocol runs in 2 phases. `init`
//! does the pre-challenge work and exposes the prover's commitments as a "tau list" and the
//! public values the verifier needs as a "c list". The caller hashes these, along with those of
//! any other proof, into one challenge which `gen_proof` uses to compute the responses. The
//! verifier recomputes the tau list from the proof and the same challenge.
//!
//! The equality proof comes first in both lists, followed by the predicate proofs in order.

pub mod eq;
pub mod predicate;

use crate::{error::CLError, setup::PrimaryPublicKey, signature::PrimarySignature};
use ark_std::{
    collections::{BTreeMap, BTreeSet},
    rand::RngCore,
    string::{String, ToString},
    vec::Vec,
};
use eq::{PrimaryEqualityProof, PrimaryEqualityProtocol};
use log::{debug, trace};
use num_bigint::BigUint;
use predicate::{GeProof, Predicate, PredicateProtocol};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryProofProtocol {
    eq: PrimaryEqualityProtocol,
    ge: Vec<PredicateProtocol>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryProof {
    pub eq_proof: PrimaryEqualityProof,
    pub ge_proofs: Vec<GeProof>,
}

impl PrimaryProofProtocol {
    /// `values` has every attribute of the key including the link secret. Attributes in
    /// `revealed` are disclosed, predicates can only be about the other attributes.
    pub fn init<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        signature: &PrimarySignature,
        values: &BTreeMap<String, BigUint>,
        revealed: &BTreeSet<String>,
        predicates: &[Predicate],
    ) -> Result<Self, CLError> {
        trace!(
            "PrimaryProofProtocol::init: >>> revealed: {:?}, predicates: {:?}",
            revealed,
            predicates
        );
        let eq = PrimaryEqualityProtocol::init(rng, pk, signature, values, revealed)?;
        let mut ge = Vec::with_capacity(predicates.len());
        for p in predicates {
            if revealed.contains(&p.attr_name) {
                return Err(CLError::PredicateOnRevealedAttribute(p.attr_name.clone()));
            }
            let (m, m_tilde) = match (eq.hidden_value(&p.attr_name), eq.m_tilde(&p.attr_name)) {
                (Some(m), Some(m_tilde)) => (m, m_tilde),
                _ => return Err(CLError::UnknownAttribute(p.attr_name.clone())),
            };
            ge.push(PredicateProtocol::init(rng, pk, p.clone(), m, m_tilde)?);
        }
        trace!("PrimaryProofProtocol::init: <<<");
        Ok(Self { eq, ge })
    }

    pub fn c_list(&self) -> Vec<Vec<u8>> {
        let mut list = self.eq.c_list();
        for g in &self.ge {
            list.append(&mut g.c_list());
        }
        list
    }

    pub fn tau_list(&self) -> Vec<Vec<u8>> {
        let mut list = self.eq.tau_list();
        for g in &self.ge {
            list.append(&mut g.tau_list());
        }
        list
    }

    /// Randomness for the credential context `m2`. A non-revocation proof about the same credential
    /// must use it so that both proofs are about the same `m2`.
    pub fn m2_tilde(&self) -> &BigUint {
        self.eq.m2_tilde()
    }

    pub fn gen_proof(self, challenge: &BigUint) -> Result<PrimaryProof, CLError> {
        let eq_proof = self.eq.gen_proof(challenge);
        // Response for each predicate's attribute is the one from the equality proof
        let ge_proofs = self
            .ge
            .into_iter()
            .map(|g| -> Result<GeProof, CLError> {
                let attr = &g.predicate().attr_name;
                let mj = eq_proof
                    .m
                    .get(attr)
                    .cloned()
                    .ok_or_else(|| CLError::UnknownAttribute(attr.clone()))?;
                Ok(g.gen_proof(challenge, mj))
            })
            .collect::<Result<Vec<_>, CLError>>()?;
        Ok(PrimaryProof {
            eq_proof,
            ge_proofs,
        })
    }
}

impl PrimaryProof {
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        let mut list = self.eq_proof.c_list();
        for g in &self.ge_proofs {
            list.append(&mut g.c_list());
        }
        list
    }

    /// Response for the credential context `m2`
    pub fn m2_cap(&self) -> &BigUint {
        &self.eq_proof.m2
    }

    pub fn revealed_attributes(&self) -> &BTreeMap<String, BigUint> {
        &self.eq_proof.revealed_attrs
    }

    /// Checks the revealed attributes are `expected_revealed`, the predicates are `predicates` and
    /// recomputes the tau list for `challenge`. The caller compares the challenge it computes from
    /// the returned list with `challenge`.
    pub fn verify_and_get_tau_list(
        &self,
        pk: &PrimaryPublicKey,
        challenge: &BigUint,
        expected_revealed: &BTreeMap<String, BigUint>,
        predicates: &[Predicate],
    ) -> Result<Vec<Vec<u8>>, CLError> {
        trace!(
            "PrimaryProof::verify_and_get_tau_list: >>> expected_revealed: {:?}, predicates: {:?}",
            expected_revealed,
            predicates
        );
        if &self.eq_proof.revealed_attrs != expected_revealed {
            debug!("PrimaryProof::verify_and_get_tau_list: revealed attributes differ");
            return Err(CLError::RevealedAttributesMismatch);
        }
        if self.ge_proofs.len() != predicates.len() {
            return Err(CLError::MalformedProof);
        }
        for (g, p) in self.ge_proofs.iter().zip(predicates) {
            if &g.predicate != p {
                return Err(CLError::MalformedProof);
            }
            match self.eq_proof.m.get(&p.attr_name) {
                Some(m) if *m == g.mj => (),
                Some(_) => return Err(CLError::PredicateResponseMismatch(p.to_string())),
                None => return Err(CLError::PredicateOnRevealedAttribute(p.attr_name.clone())),
            }
        }

        let mut tau_list = self.eq_proof.verify_and_get_tau_list(pk, challenge)?;
        for g in &self.ge_proofs {
            tau_list.append(&mut g.verify_and_get_tau_list(pk, challenge)?);
        }
        trace!("PrimaryProof::verify_and_get_tau_list: <<<");
        Ok(tau_list)
    }
}
