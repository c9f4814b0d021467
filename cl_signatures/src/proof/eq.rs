//! Proof of knowledge of a signature `(A, e, v)` revealing some attributes.
//!
//! The signature is randomized as `A' = A * s^r` and `v' = v - e*r` so that
//! `Z = A'^e * s^{v'} * rctxt^{m2} * prod(r_i^{m_i})`. With `e = 2^596 + e'`, the prover shows
//! knowledge of `e'`, `v'`, `m2` and every hidden `m_i` satisfying
//! `Z / (A'^{2^596} * prod_revealed(r_i^{m_i})) = A'^{e'} * s^{v'} * rctxt^{m2} * prod_hidden(r_i^{m_i})`.

use crate::{
    constants::{E_START_BITS, E_TILDE_BITS, LINK_SECRET_NAME, M_TILDE_BITS, V_PRIME_BITS, V_TILDE_BITS},
    error::CLError,
    setup::PrimaryPublicKey,
    signature::{e_start, PrimarySignature},
};
use anoncreds_utils::{
    bn::{mod_div, mod_exp, mod_pow, rand_bits, to_bytes},
    serde_utils::DecimalString,
};
use ark_std::{
    collections::{BTreeMap, BTreeSet},
    rand::RngCore,
    string::String,
    vec,
    vec::Vec,
};
use num_bigint::{BigInt, BigUint};
use num_traits::One;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrimaryEqualityProtocol {
    a_prime: BigUint,
    t: BigUint,
    e_prime: BigUint,
    v_prime: BigInt,
    e_tilde: BigUint,
    v_tilde: BigUint,
    m2: BigUint,
    m2_tilde: BigUint,
    revealed: BTreeMap<String, BigUint>,
    hidden: BTreeMap<String, BigUint>,
    m_tilde: BTreeMap<String, BigUint>,
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryEqualityProof {
    #[serde_as(as = "BTreeMap<_, DecimalString>")]
    pub revealed_attrs: BTreeMap<String, BigUint>,
    #[serde_as(as = "DecimalString")]
    pub a_prime: BigUint,
    #[serde_as(as = "DecimalString")]
    pub e: BigUint,
    #[serde_as(as = "DecimalString")]
    pub v: BigInt,
    /// Responses for the hidden attributes and the link secret
    #[serde_as(as = "BTreeMap<_, DecimalString>")]
    pub m: BTreeMap<String, BigUint>,
    #[serde_as(as = "DecimalString")]
    pub m2: BigUint,
}

impl PrimaryEqualityProtocol {
    /// `values` has every attribute of the key, the link secret included
    pub fn init<R: RngCore>(
        rng: &mut R,
        pk: &PrimaryPublicKey,
        signature: &PrimarySignature,
        values: &BTreeMap<String, BigUint>,
        revealed: &BTreeSet<String>,
    ) -> Result<Self, CLError> {
        if revealed.contains(LINK_SECRET_NAME) {
            return Err(CLError::ReservedAttributeName(LINK_SECRET_NAME.into()));
        }
        if values.len() != pk.r.len() {
            return Err(CLError::AttributeSetMismatch);
        }
        for k in pk.r.keys() {
            if !values.contains_key(k) {
                return Err(CLError::MissingAttributeValue(k.clone()));
            }
        }
        for k in revealed {
            pk.base_for(k)?;
        }

        let r = rand_bits(rng, V_PRIME_BITS);
        let a_prime = (&signature.a * mod_pow(&pk.s, &r, &pk.n)?) % &pk.n;
        let v_prime = BigInt::from(signature.v.clone()) - BigInt::from(&signature.e * &r);
        let e_prime = &signature.e - e_start();

        let e_tilde = rand_bits(rng, E_TILDE_BITS);
        let v_tilde = rand_bits(rng, V_TILDE_BITS);
        let m2_tilde = rand_bits(rng, M_TILDE_BITS);

        let mut revealed_values = BTreeMap::new();
        let mut hidden = BTreeMap::new();
        let mut m_tilde = BTreeMap::new();
        for (k, m) in values {
            if revealed.contains(k) {
                revealed_values.insert(k.clone(), m.clone());
            } else {
                hidden.insert(k.clone(), m.clone());
                m_tilde.insert(k.clone(), rand_bits(rng, M_TILDE_BITS));
            }
        }

        let mut t = (mod_pow(&a_prime, &e_tilde, &pk.n)? * mod_pow(&pk.s, &v_tilde, &pk.n)?)
            % &pk.n;
        for (k, m_t) in &m_tilde {
            t = (t * mod_pow(pk.base_for(k)?, m_t, &pk.n)?) % &pk.n;
        }
        t = (t * mod_pow(&pk.rctxt, &m2_tilde, &pk.n)?) % &pk.n;

        Ok(Self {
            a_prime,
            t,
            e_prime,
            v_prime,
            e_tilde,
            v_tilde,
            m2: signature.m_2.clone(),
            m2_tilde,
            revealed: revealed_values,
            hidden,
            m_tilde,
        })
    }

    pub fn c_list(&self) -> Vec<Vec<u8>> {
        vec![to_bytes(&self.a_prime)]
    }

    pub fn tau_list(&self) -> Vec<Vec<u8>> {
        vec![to_bytes(&self.t)]
    }

    pub fn m2_tilde(&self) -> &BigUint {
        &self.m2_tilde
    }

    /// Randomness for a hidden attribute, `None` if the attribute is revealed or unknown
    pub fn m_tilde(&self, attribute: &str) -> Option<&BigUint> {
        self.m_tilde.get(attribute)
    }

    pub fn hidden_value(&self, attribute: &str) -> Option<&BigUint> {
        self.hidden.get(attribute)
    }

    pub fn gen_proof(self, challenge: &BigUint) -> PrimaryEqualityProof {
        let e = challenge * &self.e_prime + &self.e_tilde;
        let v = BigInt::from(challenge.clone()) * &self.v_prime + BigInt::from(self.v_tilde);
        let m = self
            .hidden
            .iter()
            .filter_map(|(k, m)| {
                self.m_tilde
                    .get(k)
                    .map(|m_t| (k.clone(), challenge * m + m_t))
            })
            .collect();
        let m2 = challenge * &self.m2 + &self.m2_tilde;
        PrimaryEqualityProof {
            revealed_attrs: self.revealed,
            a_prime: self.a_prime,
            e,
            v,
            m,
            m2,
        }
    }
}

impl PrimaryEqualityProof {
    pub fn c_list(&self) -> Vec<Vec<u8>> {
        vec![to_bytes(&self.a_prime)]
    }

    /// Checks that revealed and hidden attributes partition the key's attributes and that the
    /// response for `e` is short enough, then recomputes the commitment `T`.
    pub fn verify_and_get_tau_list(
        &self,
        pk: &PrimaryPublicKey,
        challenge: &BigUint,
    ) -> Result<Vec<Vec<u8>>, CLError> {
        if self.e.bits() > E_TILDE_BITS + 1 {
            return Err(CLError::MalformedProof);
        }
        if !self.m.contains_key(LINK_SECRET_NAME)
            || self.revealed_attrs.len() + self.m.len() != pk.r.len()
            || !pk
                .r
                .keys()
                .all(|k| self.m.contains_key(k) ^ self.revealed_attrs.contains_key(k))
        {
            return Err(CLError::RevealedAttributesMismatch);
        }

        let mut rar = mod_pow(&self.a_prime, &(BigUint::one() << E_START_BITS), &pk.n)?;
        for (k, m) in &self.revealed_attrs {
            rar = (rar * mod_pow(pk.base_for(k)?, m, &pk.n)?) % &pk.n;
        }
        let z_rar = mod_div(&pk.z, &rar, &pk.n)?;

        let mut t = (mod_pow(&self.a_prime, &self.e, &pk.n)? * mod_exp(&pk.s, &self.v, &pk.n)?)
            % &pk.n;
        for (k, m_cap) in &self.m {
            t = (t * mod_pow(pk.base_for(k)?, m_cap, &pk.n)?) % &pk.n;
        }
        t = (t * mod_pow(&pk.rctxt, &self.m2, &pk.n)?) % &pk.n;
        t = (t * mod_exp(&z_rar, &-BigInt::from(challenge.clone()), &pk.n)?) % &pk.n;
        Ok(vec![to_bytes(&t)])
    }
}
